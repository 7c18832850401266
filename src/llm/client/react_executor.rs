//! ReAct执行器 - 带逐步思考工具的有界多轮对话

use anyhow::Result;
use rig::completion::PromptError;
use tracing::{debug, warn};

use super::providers::ProviderAgent;
use crate::llm::tools::sequential_thinking::AgentToolSequentialThinking;
use crate::mission::analysis::recommendations::Deliberation;

/// ReAct执行器
pub struct ReActExecutor;

impl ReActExecutor {
    /// 执行多轮对话；达到最大步数仍未给出最终回复时，结果中不含最终内容
    pub async fn execute(
        agent: &ProviderAgent,
        thinking: &AgentToolSequentialThinking,
        user_prompt: &str,
        max_steps: usize,
    ) -> Result<Deliberation> {
        debug!("   ♻️ 激活逐步思考对话，最大步数: {}", max_steps);
        thinking.reset();

        match agent.multi_turn(user_prompt, max_steps).await {
            Ok(response) => {
                debug!("   ✅ 对话完成，共 {} 步思考", thinking.thoughts());
                Ok(Deliberation {
                    final_content: Some(response),
                    thoughts: thinking.thoughts(),
                })
            }
            Err(PromptError::MaxDepthError { max_depth, .. }) => {
                warn!("   ⚠️ 达到最大步数 ({})，未得到最终回复", max_depth);
                Ok(Deliberation {
                    final_content: None,
                    thoughts: thinking.thoughts(),
                })
            }
            Err(e) => Err(anyhow::anyhow!("逐步思考对话失败: {}", e)),
        }
    }
}
