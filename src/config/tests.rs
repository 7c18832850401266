#[cfg(test)]
mod tests {
    use crate::config::{
        CapabilityConfig, Config, DeliveryConfig, LLMConfig, LLMProvider, MissionConfig,
        SchedulerConfig,
    };
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert!(!config.verbose);
        assert_eq!(config.mission.duration_minutes, 45);
        assert_eq!(config.delivery.output_path, PathBuf::from("./signl.reports"));
        assert_eq!(
            config.scheduler.jobs_path,
            PathBuf::from("./.signl/jobs.json")
        );
    }

    #[test]
    fn test_llm_provider_default() {
        let provider = LLMProvider::default();
        assert_eq!(provider, LLMProvider::OpenAI);
    }

    #[test]
    fn test_llm_provider_from_str() {
        assert_eq!(
            "openai".parse::<LLMProvider>().unwrap(),
            LLMProvider::OpenAI
        );
        assert_eq!(
            "DeepSeek".parse::<LLMProvider>().unwrap(),
            LLMProvider::DeepSeek
        );
        assert_eq!(
            "openrouter".parse::<LLMProvider>().unwrap(),
            LLMProvider::OpenRouter
        );
        assert_eq!(
            "anthropic".parse::<LLMProvider>().unwrap(),
            LLMProvider::Anthropic
        );
        assert_eq!(
            "ollama".parse::<LLMProvider>().unwrap(),
            LLMProvider::Ollama
        );

        assert!("invalid".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_llm_provider_display() {
        assert_eq!(LLMProvider::OpenAI.to_string(), "openai");
        assert_eq!(LLMProvider::DeepSeek.to_string(), "deepseek");
        assert_eq!(LLMProvider::OpenRouter.to_string(), "openrouter");
        assert_eq!(LLMProvider::Anthropic.to_string(), "anthropic");
        assert_eq!(LLMProvider::Ollama.to_string(), "ollama");
    }

    #[test]
    fn test_llm_config_default() {
        let config = LLMConfig::default();

        assert_eq!(config.provider, LLMProvider::OpenAI);
        // api_key may be empty if env var is not set
        assert!(!config.api_base_url.is_empty());
        assert!(!config.model.is_empty());
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay_ms, 3000);
        assert_eq!(config.timeout_seconds, 300);
    }

    #[test]
    fn test_capability_config_default() {
        let config = CapabilityConfig::default();

        assert_eq!(config.call_timeout_seconds, 600);
        assert_eq!(config.social_model, "grok-4-fast");
        assert!(config.social_base_url.starts_with("https://"));
    }

    #[test]
    fn test_mission_config_default() {
        let config = MissionConfig::default();

        assert_eq!(config.duration_minutes, 45);
        assert_eq!(config.pacing_ms, 2000);
        assert_eq!(config.initial_focus, "market strategy");
        assert_eq!(config.max_dialogue_steps, 8);
    }

    #[test]
    fn test_delivery_and_scheduler_default() {
        let delivery = DeliveryConfig::default();
        assert!(delivery.send_email);
        assert!(!delivery.sender.is_empty());

        let scheduler = SchedulerConfig::default();
        assert_eq!(scheduler.sweep_interval_seconds, 60);
    }

    #[test]
    fn test_from_file_with_partial_sections() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("signl.toml");
        std::fs::write(
            &path,
            r#"
verbose = true

[llm]
provider = "deepseek"
model = "deepseek-reasoner"

[mission]
duration_minutes = 5
pacing_ms = 0
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.verbose);
        assert_eq!(config.llm.provider, LLMProvider::DeepSeek);
        assert_eq!(config.llm.model, "deepseek-reasoner");
        // 未填写的字段回落到默认值
        assert_eq!(config.llm.retry_attempts, 3);
        assert_eq!(config.mission.duration_minutes, 5);
        assert_eq!(config.mission.pacing_ms, 0);
        assert_eq!(config.mission.initial_focus, "market strategy");
        assert_eq!(config.capabilities.call_timeout_seconds, 600);
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file(&PathBuf::from("/nonexistent/signl.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        assert!(Config::from_file(&path).is_err());
    }
}
