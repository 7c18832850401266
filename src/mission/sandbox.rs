//! 执行环境 - 任务独占的外部执行上下文，作用域结束时无论成败都会释放

use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CapabilityConfig;

/// 已分配的执行环境
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxHandle {
    pub id: String,
    pub gateway_url: String,
    pub token: String,
}

/// 执行环境提供方
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    async fn provision(&self) -> Result<SandboxHandle>;

    async fn release(&self, handle: &SandboxHandle) -> Result<()>;
}

/// 使用配置中固定网关的提供方，释放时无需额外动作
pub struct StaticSandboxProvider {
    gateway_url: String,
    token: String,
}

impl StaticSandboxProvider {
    pub fn from_config(config: &CapabilityConfig) -> Self {
        Self {
            gateway_url: config.gateway_url.clone(),
            token: config.gateway_token.clone(),
        }
    }
}

#[async_trait]
impl SandboxProvider for StaticSandboxProvider {
    async fn provision(&self) -> Result<SandboxHandle> {
        Ok(SandboxHandle {
            id: format!("static-{}", Uuid::new_v4().simple()),
            gateway_url: self.gateway_url.clone(),
            token: self.token.clone(),
        })
    }

    async fn release(&self, handle: &SandboxHandle) -> Result<()> {
        debug!("   🧹 释放执行环境 {}", handle.id);
        Ok(())
    }
}

/// 在执行环境的作用域内运行 `body`
///
/// 正常返回、返回错误或发生panic时都会释放环境；panic在释放后继续向上传播。
pub async fn with_sandbox<P, F, Fut, T>(provider: &P, body: F) -> Result<T>
where
    P: SandboxProvider + ?Sized,
    F: FnOnce(SandboxHandle) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let handle = provider.provision().await?;
    let outcome = AssertUnwindSafe(body(handle.clone())).catch_unwind().await;

    if let Err(e) = provider.release(&handle).await {
        warn!("⚠️ 执行环境 {} 释放失败: {:#}", handle.id, e);
    }

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
