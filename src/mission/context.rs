use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::capability::{CapabilityId, CapabilityProvider};
use crate::memory::GraphMemory;
use crate::mission::analysis::recommendations::ReasoningService;
use crate::mission::outlet::ReportDelivery;
use crate::types::finding::Finding;

/// 任务阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissionPhase {
    #[default]
    Research,
    Analysis,
    Synthesis,
    Report,
}

impl std::fmt::Display for MissionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionPhase::Research => write!(f, "research"),
            MissionPhase::Analysis => write!(f, "analysis"),
            MissionPhase::Synthesis => write!(f, "synthesis"),
            MissionPhase::Report => write!(f, "report"),
        }
    }
}

/// 任务运行指标
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MissionMetrics {
    /// 能力调用总次数（含无结果的调用）
    pub total_tool_calls: u64,
    /// 按能力统计的调用次数
    pub calls_by_capability: BTreeMap<String, u64>,
    pub kg_writes: u64,
    pub kg_reads: u64,
    /// 因时效不足被丢弃的Finding数
    pub recency_filtered: u64,
    pub sequential_thoughts: u64,
}

impl MissionMetrics {
    pub fn record_call(&mut self, capability: CapabilityId) {
        self.total_tool_calls += 1;
        *self
            .calls_by_capability
            .entry(capability.as_str().to_string())
            .or_insert(0) += 1;
    }
}

/// 单次任务的可变研究状态
#[derive(Debug, Clone)]
pub struct ResearchState {
    pub phase: MissionPhase,
    pub findings: Vec<Finding>,
    pub iteration_count: u64,
    pub started_at: DateTime<Utc>,
    /// 单调时钟起点，用于计算耗时
    pub started: Instant,
    pub metrics: MissionMetrics,
}

impl Default for ResearchState {
    fn default() -> Self {
        Self::new()
    }
}

impl ResearchState {
    pub fn new() -> Self {
        Self {
            phase: MissionPhase::default(),
            findings: Vec::new(),
            iteration_count: 0,
            started_at: Utc::now(),
            started: Instant::now(),
            metrics: MissionMetrics::default(),
        }
    }

    pub fn enter(&mut self, phase: MissionPhase) {
        self.phase = phase;
    }

    pub fn elapsed_minutes(&self) -> u64 {
        self.started.elapsed().as_secs() / 60
    }
}

/// 任务依赖的外部服务
#[derive(Clone)]
pub struct MissionServices {
    /// 检索/推理/社交信号能力
    pub provider: Arc<dyn CapabilityProvider>,
    /// 知识图谱存储
    pub graph: Arc<dyn GraphMemory>,
    /// 推理对话服务
    pub reasoning: Arc<dyn ReasoningService>,
    /// 报告投递，为空时只落盘
    pub delivery: Option<Arc<dyn ReportDelivery>>,
    /// 是否可以使用逐步思考
    pub thinking_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_call_counts_per_capability() {
        let mut metrics = MissionMetrics::default();
        metrics.record_call(CapabilityId::WebSearch);
        metrics.record_call(CapabilityId::WebSearch);
        metrics.record_call(CapabilityId::SocialSearch);

        assert_eq!(metrics.total_tool_calls, 3);
        assert_eq!(metrics.calls_by_capability.get("exa"), Some(&2));
        assert_eq!(metrics.calls_by_capability.get("xai"), Some(&1));
        assert_eq!(metrics.calls_by_capability.get("perplexity"), None);
    }

    #[test]
    fn test_new_state_starts_in_research() {
        let state = ResearchState::new();
        assert_eq!(state.phase, MissionPhase::Research);
        assert!(state.findings.is_empty());
        assert_eq!(state.elapsed_minutes(), 0);
    }
}
