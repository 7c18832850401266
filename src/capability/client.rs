//! 能力客户端 - 将逻辑能力分派到网关工具或社交检索服务

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    CapabilityError, CapabilityId, CapabilityProvider, CapabilityRegistry, GatewayTool,
    McpGateway, SocialSearchClient,
};
use crate::mission::research::recency::RecencyWindow;

/// 基于注册表的能力客户端
pub struct CapabilityClient {
    gateway: Arc<McpGateway>,
    registry: CapabilityRegistry,
    social: Option<SocialSearchClient>,
}

impl CapabilityClient {
    pub fn new(
        gateway: Arc<McpGateway>,
        registry: CapabilityRegistry,
        social: Option<SocialSearchClient>,
    ) -> Self {
        Self {
            gateway,
            registry,
            social,
        }
    }

    async fn call_gateway(
        &self,
        tool: GatewayTool,
        arguments: serde_json::Value,
    ) -> Result<Option<String>, CapabilityError> {
        let Some(name) = self.registry.tool_name(tool) else {
            return Ok(None);
        };
        let result = self.gateway.call_tool(name, arguments).await?;
        Ok(Some(serde_json::to_string(&result)?))
    }

    /// 深度研究在 reason 与 research 两个工具之间随机切换，缺失一方时使用另一方
    fn pick_research_tool(&self) -> GatewayTool {
        let preferred = if rand::random::<bool>() {
            GatewayTool::PerplexityReason
        } else {
            GatewayTool::PerplexityResearch
        };
        if self.registry.tool_name(preferred).is_some() {
            preferred
        } else if preferred == GatewayTool::PerplexityReason {
            GatewayTool::PerplexityResearch
        } else {
            GatewayTool::PerplexityReason
        }
    }

    async fn dispatch(
        &self,
        id: CapabilityId,
        query: &str,
    ) -> Result<Option<String>, CapabilityError> {
        match id {
            CapabilityId::WebSearch => {
                self.call_gateway(
                    GatewayTool::WebSearchExa,
                    json!({ "query": query, "num_results": 10, "search_type": "neural" }),
                )
                .await
            }
            CapabilityId::DeepResearch => {
                self.call_gateway(
                    self.pick_research_tool(),
                    json!({ "messages": [{ "role": "user", "content": query }] }),
                )
                .await
            }
            CapabilityId::SocialSearch => match &self.social {
                Some(social) => {
                    let since = RecencyWindow::now().cutoff_label();
                    social.search(query, &since).await
                }
                None => Ok(None),
            },
        }
    }
}

#[async_trait]
impl CapabilityProvider for CapabilityClient {
    async fn invoke(&self, id: CapabilityId, query: &str) -> Option<String> {
        debug!("   🔧 capability called...{}@{}", id, query);
        match self.dispatch(id, query).await {
            Ok(result) => result,
            Err(e) => {
                warn!("   ⚠️ 能力 {} 调用失败: {}", id, e);
                None
            }
        }
    }
}
