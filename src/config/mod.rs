use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 推理对话服务配置
    pub llm: LLMConfig,

    /// 外部能力（检索/推理/社交信号）配置
    pub capabilities: CapabilityConfig,

    /// 任务执行参数
    pub mission: MissionConfig,

    /// 报告投递配置
    pub delivery: DeliveryConfig,

    /// 周期任务配置
    pub scheduler: SchedulerConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 用于战略推理的模型
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

/// 能力网关配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CapabilityConfig {
    /// 工具网关（MCP）地址
    pub gateway_url: String,

    /// 工具网关访问令牌
    pub gateway_token: String,

    /// 社交信号检索服务基地址
    pub social_base_url: String,

    /// 社交信号检索服务 API KEY，为空时视为该能力不可用
    pub social_api_key: String,

    /// 社交信号检索模型
    pub social_model: String,

    /// 单次能力调用超时（秒）
    pub call_timeout_seconds: u64,
}

/// 任务执行参数
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MissionConfig {
    /// 默认任务时长（分钟）
    pub duration_minutes: u64,

    /// 两次研究迭代之间的间隔（毫秒）
    pub pacing_ms: u64,

    /// 每个竞争对手的初始研究焦点
    pub initial_focus: String,

    /// 推理对话的最大步数
    pub max_dialogue_steps: usize,
}

/// 报告投递配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DeliveryConfig {
    /// 报告输出目录
    pub output_path: PathBuf,

    /// 是否通过邮件投递报告
    pub send_email: bool,

    /// 发件人地址
    pub sender: String,
}

/// 周期任务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 周期任务存储文件
    pub jobs_path: PathBuf,

    /// 扫描间隔（秒）
    pub sweep_interval_seconds: u64,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LLMConfig::default(),
            capabilities: CapabilityConfig::default(),
            mission: MissionConfig::default(),
            delivery: DeliveryConfig::default(),
            scheduler: SchedulerConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("SIGNL_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api.groq.com/openai/v1"),
            model: String::from("openai/gpt-oss-120b"),
            max_tokens: 8192,
            temperature: 0.3,
            retry_attempts: 3,
            retry_delay_ms: 3000,
            timeout_seconds: 300,
        }
    }
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            gateway_url: String::from("http://127.0.0.1:50005/mcp"),
            gateway_token: std::env::var("SIGNL_GATEWAY_TOKEN").unwrap_or_default(),
            social_base_url: String::from("https://api.x.ai/v1"),
            social_api_key: std::env::var("XAI_API_KEY").unwrap_or_default(),
            social_model: String::from("grok-4-fast"),
            call_timeout_seconds: 600,
        }
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: 45,
            pacing_ms: 2000,
            initial_focus: String::from("market strategy"),
            max_dialogue_steps: 8,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./signl.reports"),
            send_email: true,
            sender: String::from("onboarding@resend.dev"),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            jobs_path: PathBuf::from("./.signl/jobs.json"),
            sweep_interval_seconds: 60,
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
