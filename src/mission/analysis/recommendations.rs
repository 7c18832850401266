use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

use crate::mission::context::MissionMetrics;
use crate::types::finding::Finding;

static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"));

/// 一次多轮推理对话的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deliberation {
    /// 最终的纯文本回复；步数耗尽仍在调用思考工具时为空
    pub final_content: Option<String>,
    /// 对话过程中产生的思考步数
    pub thoughts: usize,
}

/// 推理对话服务
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// 单轮请求
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// 允许模型调用思考工具的多轮对话，最多 `max_steps` 步
    async fn deliberate(&self, prompt: &str, max_steps: usize) -> Result<Deliberation>;
}

/// 战略建议合成器
pub struct RecommendationSynthesizer {
    reasoning: Arc<dyn ReasoningService>,
    thinking_available: bool,
    max_steps: usize,
}

impl RecommendationSynthesizer {
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        thinking_available: bool,
        max_steps: usize,
    ) -> Self {
        Self {
            reasoning,
            thinking_available,
            max_steps,
        }
    }

    /// 生成建议列表，任何失败都只会得到更少（或空）的建议
    pub async fn synthesize(
        &self,
        company: &str,
        competitor: &str,
        findings: &[Finding],
        metrics: &mut MissionMetrics,
    ) -> Vec<String> {
        info!("🧠 正在推理战略建议...");

        if !self.thinking_available {
            return self.single_shot(company, competitor, findings).await;
        }

        let prompt = format!(
            "Generate 5 recommendations using sequentialthinking. Context: {} vs {}. Findings: {}",
            company,
            competitor,
            findings_json(findings, 5)
        );
        match self.reasoning.deliberate(&prompt, self.max_steps).await {
            Ok(deliberation) => {
                metrics.sequential_thoughts += deliberation.thoughts as u64;
                deliberation
                    .final_content
                    .map(|content| parse_recommendations(&content))
                    .unwrap_or_default()
            }
            Err(e) => {
                warn!("⚠️ 推理对话失败: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn single_shot(&self, company: &str, competitor: &str, findings: &[Finding]) -> Vec<String> {
        let prompt = format!(
            "Generate 5 strategic recommendations for {} vs {} based on findings: {}",
            company,
            competitor,
            findings_json(findings, 3)
        );
        match self.reasoning.complete(&prompt).await {
            Ok(reply) => lines_longer_than(&reply, 20),
            Err(e) => {
                warn!("⚠️ 建议生成失败: {:#}", e);
                Vec::new()
            }
        }
    }
}

fn findings_json(findings: &[Finding], limit: usize) -> String {
    let head = &findings[..findings.len().min(limit)];
    serde_json::to_string(head).unwrap_or_else(|_| String::from("[]"))
}

/// 优先解析回复中的JSON数组，失败时按行拆分
pub fn parse_recommendations(content: &str) -> Vec<String> {
    if let Some(found) = JSON_ARRAY.find(content)
        && let Ok(list) = serde_json::from_str::<Vec<String>>(found.as_str())
    {
        return list;
    }
    lines_longer_than(content, 10)
}

fn lines_longer_than(text: &str, min_chars: usize) -> Vec<String> {
    text.lines()
        .filter(|line| line.chars().count() > min_chars)
        .map(str::to_string)
        .collect()
}
