//! 外部能力层 - 检索、深度推理与社交信号能力的统一入口

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

pub mod client;
pub mod gateway;
pub mod registry;
pub mod social;

pub use client::CapabilityClient;
pub use gateway::McpGateway;
pub use registry::{CapabilityRegistry, GatewayTool};
pub use social::SocialSearchClient;

/// 逻辑能力标识，枚举顺序即多样性选择时的平局裁决顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityId {
    /// 广域网页检索
    WebSearch,
    /// 深度推理/研究
    DeepResearch,
    /// 社交信号检索
    SocialSearch,
}

impl CapabilityId {
    pub const ALL: [CapabilityId; 3] = [
        CapabilityId::WebSearch,
        CapabilityId::DeepResearch,
        CapabilityId::SocialSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityId::WebSearch => "exa",
            CapabilityId::DeepResearch => "perplexity",
            CapabilityId::SocialSearch => "xai",
        }
    }
}

impl std::fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 能力层错误
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("required capabilities are not registered: {0:?}")]
    Missing(Vec<CapabilityId>),

    #[error("graph memory tools (memory-*) are not exposed by the gateway")]
    MissingGraphMemory,

    #[error("no capability left to select after exclusions")]
    Exhausted,

    #[error("gateway error {code}: {message}")]
    Gateway { code: i64, message: String },

    #[error("tool {tool} reported an error: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("gateway returned no result")]
    NoResult,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 能力提供方
///
/// 调用失败（网络、超时、服务错误）一律吞掉并返回 `None`。
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn invoke(&self, id: CapabilityId, query: &str) -> Option<String>;
}

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));
static TEXT_WRAPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{"type":"text","text":".*?"\}"#).expect("valid regex"));

/// 从工具结果中取出第一段文本内容
pub fn first_text_content(value: &Value) -> Option<String> {
    if let Some(items) = value.get("content").and_then(Value::as_array) {
        return items
            .iter()
            .find(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            .and_then(|item| item.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    value
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// 清洗能力返回的原始文本：展开结构化结果、去除思考块与markdown符号，截断到500字符
pub fn clean_text(raw: &str) -> String {
    let mut text = raw.to_string();
    if let Ok(parsed) = serde_json::from_str::<Value>(raw)
        && let Some(inner) = first_text_content(&parsed)
    {
        text = inner;
    }

    let text = THINK_BLOCK.replace_all(&text, "");
    let text = TEXT_WRAPPER.replace_all(&text, "");
    let text = text.replace("\\n", "\n").replace(['*', '#'], "");
    crate::utils::text::truncate_chars(text.trim(), 500)
}
