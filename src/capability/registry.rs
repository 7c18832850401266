//! 能力注册 - 把网关发现的工具名映射为类型化的工具标识

use std::collections::HashMap;

use super::{CapabilityError, CapabilityId};

/// 网关上需要识别的工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayTool {
    WebSearchExa,
    PerplexityAsk,
    PerplexityReason,
    PerplexityResearch,
    SequentialThinking,
    SendEmail,
    GraphMemory,
}

impl GatewayTool {
    const ALL: [GatewayTool; 7] = [
        GatewayTool::WebSearchExa,
        GatewayTool::PerplexityAsk,
        GatewayTool::PerplexityReason,
        GatewayTool::PerplexityResearch,
        GatewayTool::SequentialThinking,
        GatewayTool::SendEmail,
        GatewayTool::GraphMemory,
    ];

    /// 用于匹配网关工具名的特征片段
    fn markers(&self) -> &'static [&'static str] {
        match self {
            GatewayTool::WebSearchExa => &["web_search_exa"],
            GatewayTool::PerplexityAsk => &["perplexity_ask"],
            GatewayTool::PerplexityReason => &["perplexity_reason"],
            GatewayTool::PerplexityResearch => &["perplexity_research"],
            GatewayTool::SequentialThinking => &["sequentialthinking"],
            GatewayTool::SendEmail => &["send-email", "send_email"],
            GatewayTool::GraphMemory => &["memory-"],
        }
    }
}

/// 类型化的能力注册表
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    tools: HashMap<GatewayTool, String>,
    social_enabled: bool,
}

impl CapabilityRegistry {
    /// 根据网关发现的工具名构建注册表，同一工具以首个匹配为准
    pub fn from_discovered<S: AsRef<str>>(names: &[S], social_enabled: bool) -> Self {
        let mut tools = HashMap::new();
        for name in names {
            let name = name.as_ref();
            for tool in GatewayTool::ALL {
                if tool.markers().iter().any(|marker| name.contains(marker)) {
                    tools.entry(tool).or_insert_with(|| name.to_string());
                }
            }
        }
        Self {
            tools,
            social_enabled,
        }
    }

    /// 网关上该工具的实际名称
    pub fn tool_name(&self, tool: GatewayTool) -> Option<&str> {
        self.tools.get(&tool).map(String::as_str)
    }

    pub fn supports(&self, capability: CapabilityId) -> bool {
        match capability {
            CapabilityId::WebSearch => self.tools.contains_key(&GatewayTool::WebSearchExa),
            CapabilityId::DeepResearch => {
                self.tools.contains_key(&GatewayTool::PerplexityReason)
                    || self.tools.contains_key(&GatewayTool::PerplexityResearch)
            }
            CapabilityId::SocialSearch => self.social_enabled,
        }
    }

    /// 按枚举顺序列出已注册的能力
    pub fn available(&self) -> Vec<CapabilityId> {
        CapabilityId::ALL
            .into_iter()
            .filter(|capability| self.supports(*capability))
            .collect()
    }

    /// 校验全部必需能力以及图谱记忆服务均已注册
    pub fn require_all(&self) -> Result<(), CapabilityError> {
        let missing: Vec<_> = CapabilityId::ALL
            .into_iter()
            .filter(|capability| !self.supports(*capability))
            .collect();
        if !missing.is_empty() {
            return Err(CapabilityError::Missing(missing));
        }
        if !self.has_graph_memory() {
            return Err(CapabilityError::MissingGraphMemory);
        }
        Ok(())
    }

    pub fn has_graph_memory(&self) -> bool {
        self.tools.contains_key(&GatewayTool::GraphMemory)
    }

    /// 是否具备结构化思考能力
    pub fn has_thinking(&self) -> bool {
        self.tools.contains_key(&GatewayTool::SequentialThinking)
    }
}
