//! 逐步思考工具 - 模型通过它记录中间思考，工具只做确认

use anyhow::Result;
use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use crate::utils::text::truncate_chars;

/// 逐步思考工具
#[derive(Debug, Clone, Default)]
pub struct AgentToolSequentialThinking {
    thoughts: Arc<AtomicUsize>,
}

/// 思考参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtArgs {
    pub thought: String,
    #[serde(default)]
    pub next_thought_needed: bool,
    #[serde(default)]
    pub thought_number: u32,
    #[serde(default)]
    pub total_thoughts: u32,
}

/// 思考确认
#[derive(Debug, Serialize, PartialEq)]
pub struct ThoughtAck {
    pub status: String,
}

/// 逐步思考工具错误
#[derive(Debug, thiserror::Error)]
#[error("Sequential thinking tool error")]
pub struct ThinkingToolError;

impl AgentToolSequentialThinking {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录的思考步数
    pub fn thoughts(&self) -> usize {
        self.thoughts.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.thoughts.store(0, Ordering::SeqCst);
    }

    fn acknowledge(&self, args: &ThoughtArgs) -> ThoughtAck {
        self.thoughts.fetch_add(1, Ordering::SeqCst);
        info!(
            "   💭 Thought {}/{}: {}...",
            args.thought_number,
            args.total_thoughts,
            truncate_chars(&args.thought, 60)
        );
        ThoughtAck {
            status: String::from("ok"),
        }
    }
}

impl Tool for AgentToolSequentialThinking {
    const NAME: &'static str = "sequentialthinking";

    type Error = ThinkingToolError;
    type Args = ThoughtArgs;
    type Output = ThoughtAck;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Problem solving tool".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "thought": { "type": "string" },
                    "nextThoughtNeeded": { "type": "boolean" },
                    "thoughtNumber": { "type": "integer" },
                    "totalThoughts": { "type": "integer" }
                },
                "required": ["thought", "thoughtNumber", "totalThoughts", "nextThoughtNeeded"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(self.acknowledge(&args))
    }
}
