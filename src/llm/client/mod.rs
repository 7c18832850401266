//! LLM客户端 - 提供统一的推理对话服务接口

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::LLMConfig;
use crate::llm::tools::sequential_thinking::AgentToolSequentialThinking;
use crate::mission::analysis::recommendations::{Deliberation, ReasoningService};

mod providers;
mod react_executor;

use providers::ProviderClient;
use react_executor::ReActExecutor;

const SYSTEM_PROMPT: &str =
    "You are a competitive intelligence strategist advising a startup founder.";

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { config, client })
    }

    /// 检查模型连接是否正常
    pub async fn check_connection(&self) -> Result<()> {
        info!("🔄 正在检查模型连接...");
        match self.complete("Hello").await {
            Ok(_) => {
                info!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                warn!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 通用重试逻辑，每次尝试都有独立的超时
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let mut retries = 0;

        loop {
            let outcome = match tokio::time::timeout(timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!(
                    "模型服务在 {} 秒内未响应",
                    timeout.as_secs()
                )),
            };
            match outcome {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    warn!(
                        "❌ 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        retries, max_retries, err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl ReasoningService for LLMClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let agent = self.client.create_agent(SYSTEM_PROMPT, &self.config);
        self.retry_with_backoff(|| async { agent.prompt(prompt).await })
            .await
    }

    async fn deliberate(&self, prompt: &str, max_steps: usize) -> Result<Deliberation> {
        let thinking = AgentToolSequentialThinking::new();
        let agent = self
            .client
            .create_thinking_agent(SYSTEM_PROMPT, &self.config, &thinking);
        self.retry_with_backoff(|| async {
            ReActExecutor::execute(&agent, &thinking, prompt, max_steps).await
        })
        .await
    }
}
