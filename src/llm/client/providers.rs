//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::{Agent, AgentBuilder},
    client::CompletionClient,
    completion::{CompletionModel, Prompt, PromptError},
};

use crate::{
    config::{LLMConfig, LLMProvider},
    llm::tools::sequential_thinking::AgentToolSequentialThinking,
};

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    DeepSeek(rig::providers::deepseek::Client),
    OpenRouter(rig::providers::openrouter::Client),
    Anthropic(rig::providers::anthropic::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        match config.provider {
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::DeepSeek => {
                let client = rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::DeepSeek(client))
            }
            LLMProvider::OpenRouter => {
                let client = rig::providers::openrouter::Client::builder(&config.api_key).build();
                Ok(ProviderClient::OpenRouter(client))
            }
            LLMProvider::Anthropic => {
                let client =
                    rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    /// 创建不带工具的Agent
    pub fn create_agent(&self, system_prompt: &str, config: &LLMConfig) -> ProviderAgent {
        self.build_agent(system_prompt, config, None)
    }

    /// 创建挂载逐步思考工具的Agent
    pub fn create_thinking_agent(
        &self,
        system_prompt: &str,
        config: &LLMConfig,
        thinking: &AgentToolSequentialThinking,
    ) -> ProviderAgent {
        self.build_agent(system_prompt, config, Some(thinking))
    }

    fn build_agent(
        &self,
        system_prompt: &str,
        config: &LLMConfig,
        thinking: Option<&AgentToolSequentialThinking>,
    ) -> ProviderAgent {
        let model = config.model.as_str();
        match self {
            ProviderClient::OpenAI(client) => {
                let builder = client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder();
                ProviderAgent::OpenAI(finish_agent(builder, system_prompt, config, thinking))
            }
            ProviderClient::DeepSeek(client) => ProviderAgent::DeepSeek(finish_agent(
                client.agent(model),
                system_prompt,
                config,
                thinking,
            )),
            ProviderClient::OpenRouter(client) => ProviderAgent::OpenRouter(finish_agent(
                client.agent(model),
                system_prompt,
                config,
                thinking,
            )),
            ProviderClient::Anthropic(client) => ProviderAgent::Anthropic(finish_agent(
                client.agent(model),
                system_prompt,
                config,
                thinking,
            )),
            ProviderClient::Ollama(client) => ProviderAgent::Ollama(finish_agent(
                client.agent(model),
                system_prompt,
                config,
                thinking,
            )),
        }
    }
}

/// 为任意provider的AgentBuilder补齐公共参数，按需挂载思考工具
fn finish_agent<M: CompletionModel>(
    builder: AgentBuilder<M>,
    system_prompt: &str,
    config: &LLMConfig,
    thinking: Option<&AgentToolSequentialThinking>,
) -> Agent<M> {
    let builder = builder
        .preamble(system_prompt)
        .max_tokens(config.max_tokens.into())
        .temperature(config.temperature);
    match thinking {
        Some(tool) => builder.tool(tool.clone()).build(),
        None => builder.build(),
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    OpenRouter(Agent<rig::providers::openrouter::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    /// 执行prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::OpenRouter(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
        }
    }

    /// 执行多轮对话
    pub async fn multi_turn(
        &self,
        prompt: &str,
        max_iterations: usize,
    ) -> Result<String, PromptError> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::OpenRouter(agent) => {
                agent.prompt(prompt).multi_turn(max_iterations).await
            }
            ProviderAgent::Anthropic(agent) => {
                agent.prompt(prompt).multi_turn(max_iterations).await
            }
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(agent: &ProviderAgent) -> &'static str {
        match agent {
            ProviderAgent::OpenAI(_) => "openai",
            ProviderAgent::DeepSeek(_) => "deepseek",
            ProviderAgent::OpenRouter(_) => "openrouter",
            ProviderAgent::Anthropic(_) => "anthropic",
            ProviderAgent::Ollama(_) => "ollama",
        }
    }

    #[tokio::test]
    async fn test_plain_and_thinking_agents_share_provider() {
        let thinking = AgentToolSequentialThinking::new();
        for provider in [
            LLMProvider::OpenAI,
            LLMProvider::DeepSeek,
            LLMProvider::OpenRouter,
            LLMProvider::Anthropic,
            LLMProvider::Ollama,
        ] {
            let config = LLMConfig {
                provider: provider.clone(),
                api_key: "test-key".to_string(),
                ..Default::default()
            };
            let client = ProviderClient::new(&config).unwrap();

            let plain = client.create_agent("system", &config);
            let with_tool = client.create_thinking_agent("system", &config, &thinking);
            assert_eq!(variant(&plain), provider.to_string());
            assert_eq!(variant(&with_tool), provider.to_string());
        }
    }
}
