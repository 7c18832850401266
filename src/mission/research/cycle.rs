//! 研究周期 - 一次串行的 研究→分析→验证 三步调用，最多产出一条Finding

use tracing::debug;

use super::classify::{assess_impact, categorize};
use super::recency::RecencyGate;
use crate::capability::{CapabilityId, CapabilityProvider, clean_text};
use crate::mission::context::MissionMetrics;
use crate::types::finding::{Confidence, Evidence, Finding};
use crate::utils::text::{collapse_newlines, truncate_chars};

/// 三个槽位的固定可信度
const SLOT_CREDIBILITY: [u8; 3] = [85, 90, 88];
const SIGNAL_MAX_CHARS: usize = 120;
const SNIPPET_MAX_CHARS: usize = 500;

/// 研究周期
#[derive(Debug, Clone, Default)]
pub struct ResearchCycle {
    gate: RecencyGate,
}

impl ResearchCycle {
    pub fn new(gate: RecencyGate) -> Self {
        Self { gate }
    }

    /// 依次调用三个能力；任一调用无结果即放弃本周期，不产出部分Finding
    pub async fn run(
        &self,
        provider: &dyn CapabilityProvider,
        competitor: &str,
        focus: &str,
        tools: [CapabilityId; 3],
        metrics: &mut MissionMetrics,
    ) -> Option<Finding> {
        let query = self.gate.qualify(&format!("{} {}", competitor, focus));
        let insight1 = clean_text(&Self::call(provider, tools[0], &query, metrics).await?);

        let query = self.gate.qualify(&format!(
            "Analyze: {}. What does this indicate about {}?",
            insight1, competitor
        ));
        let insight2 = clean_text(&Self::call(provider, tools[1], &query, metrics).await?);

        let query = self
            .gate
            .qualify(&format!("Validate: {}. Is this accurate?", insight2));
        let insight3 = clean_text(&Self::call(provider, tools[2], &query, metrics).await?);

        let evidence = [&insight1, &insight2, &insight3]
            .into_iter()
            .zip(tools)
            .zip(SLOT_CREDIBILITY)
            .map(|((snippet, tool), credibility)| {
                Evidence::new(
                    tool.as_str(),
                    truncate_chars(snippet, SNIPPET_MAX_CHARS),
                    credibility,
                )
            })
            .collect();

        let signal = truncate_chars(
            &collapse_newlines(&format!("{}: {}", competitor, insight2)),
            SIGNAL_MAX_CHARS,
        );

        Some(Finding::new(
            categorize(focus),
            signal,
            evidence,
            Confidence::High,
            assess_impact(&insight2),
        ))
    }

    async fn call(
        provider: &dyn CapabilityProvider,
        tool: CapabilityId,
        query: &str,
        metrics: &mut MissionMetrics,
    ) -> Option<String> {
        metrics.record_call(tool);
        let result = provider.invoke(tool, query).await;
        if result.is_none() {
            debug!("   ⏭️ {} 无结果，放弃本轮研究", tool);
        }
        result
    }
}
