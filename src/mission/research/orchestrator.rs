use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::cycle::ResearchCycle;
use super::diversity::ToolDiversityEnforcer;
use super::recency::RecencyGate;
use crate::capability::{CapabilityError, CapabilityId, CapabilityProvider};
use crate::memory::KnowledgeGraph;
use crate::mission::context::ResearchState;

/// 循环使用的研究焦点
pub const FOCUS_AREAS: [&str; 8] = [
    "product launches",
    "pricing strategy",
    "leadership hires",
    "market expansion",
    "customer sentiment",
    "partnerships",
    "funding",
    "positioning",
];

/// 每隔多少次迭代切换一次焦点
const FOCUS_ROTATION_INTERVAL: u64 = 3;

/// 深度研究编排器
///
/// 多样性选择器在同一任务的所有竞争对手之间共享。
pub struct DeepResearchOrchestrator {
    provider: Arc<dyn CapabilityProvider>,
    graph: KnowledgeGraph,
    enforcer: ToolDiversityEnforcer<CapabilityId>,
    cycle: ResearchCycle,
    gate: RecencyGate,
    pacing: Duration,
}

impl DeepResearchOrchestrator {
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        graph: KnowledgeGraph,
        gate: RecencyGate,
        pacing: Duration,
    ) -> Self {
        Self {
            provider,
            graph,
            enforcer: ToolDiversityEnforcer::new(CapabilityId::ALL),
            cycle: ResearchCycle::new(gate.clone()),
            gate,
            pacing,
        }
    }

    /// 在时间预算内持续研究单个竞争对手
    ///
    /// 只在迭代之间检查预算，最后一次迭代可能超出预算一个周期的耗时。
    pub async fn run(
        &mut self,
        competitor: &str,
        initial_focus: &str,
        budget: Duration,
        state: &mut ResearchState,
    ) -> Result<()> {
        info!("🎯 开始研究 {}，预算 {} 秒", competitor, budget.as_secs());

        let prior = self.graph.check_existing_knowledge(competitor).await;
        state.metrics.kg_reads += 1;
        if prior.exists {
            info!("   📚 图谱中已有 {} 的相关知识（置信度 {}）", competitor, prior.confidence);
        }

        let started = Instant::now();
        let mut focus = initial_focus.to_string();
        let mut iteration: u64 = 0;

        while started.elapsed() < budget {
            iteration += 1;
            state.iteration_count += 1;

            let tools = self.select_tools()?;
            debug!(
                "   🔄 第 {} 轮 [{} 分钟] 焦点: {} 工具: {}/{}/{}",
                iteration,
                started.elapsed().as_secs() / 60,
                focus,
                tools[0],
                tools[1],
                tools[2]
            );

            let produced = self
                .cycle
                .run(
                    self.provider.as_ref(),
                    competitor,
                    &focus,
                    tools,
                    &mut state.metrics,
                )
                .await;

            if let Some(finding) = produced {
                if self.gate.is_recent(&finding.signal) {
                    info!("   ✅ [{}] {}", finding.category, finding.signal);
                    if self.graph.record_finding(&finding, competitor, &focus).await {
                        state.metrics.kg_writes += 1;
                    }
                    state.findings.push(finding);
                } else {
                    debug!("   🕰️ 信号不够新，已丢弃: {}", finding.signal);
                    state.metrics.recency_filtered += 1;
                }
            }

            if iteration % FOCUS_ROTATION_INTERVAL == 0 {
                focus = next_focus(iteration).to_string();
            }

            tokio::time::sleep(self.pacing).await;
        }

        info!("✓ {} 研究完成，共 {} 轮", competitor, iteration);
        Ok(())
    }

    fn select_tools(&mut self) -> Result<[CapabilityId; 3], CapabilityError> {
        let selected = self.enforcer.select_distinct(3)?;
        selected
            .try_into()
            .map_err(|_| CapabilityError::Exhausted)
    }
}

fn next_focus(iteration: u64) -> &'static str {
    FOCUS_AREAS[(iteration % FOCUS_AREAS.len() as u64) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{GraphMemory, LocalGraphMemory};
    use crate::types::graph::{GraphEntity, GraphRelation, GraphSnapshot, ObservationBatch};
    use anyhow::bail;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// 固定返回同一段文本，并记录所有查询
    struct EchoProvider {
        reply: Option<String>,
        queries: Mutex<Vec<(CapabilityId, String)>>,
    }

    impl EchoProvider {
        fn new(reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn first_queries(&self) -> Vec<String> {
            self.queries
                .lock()
                .unwrap()
                .iter()
                .step_by(3)
                .map(|(_, q)| q.clone())
                .collect()
        }
    }

    #[async_trait]
    impl CapabilityProvider for EchoProvider {
        async fn invoke(&self, id: CapabilityId, query: &str) -> Option<String> {
            self.queries.lock().unwrap().push((id, query.to_string()));
            self.reply.clone()
        }
    }

    /// 图谱服务不可用，所有读写均失败
    struct OfflineGraph;

    #[async_trait]
    impl GraphMemory for OfflineGraph {
        async fn create_entities(&self, _: Vec<GraphEntity>) -> anyhow::Result<()> {
            bail!("graph offline")
        }
        async fn create_relations(&self, _: Vec<GraphRelation>) -> anyhow::Result<()> {
            bail!("graph offline")
        }
        async fn add_observations(&self, _: Vec<ObservationBatch>) -> anyhow::Result<()> {
            bail!("graph offline")
        }
        async fn search_nodes(&self, _: &str) -> anyhow::Result<GraphSnapshot> {
            bail!("graph offline")
        }
        async fn open_nodes(&self, _: &[String]) -> anyhow::Result<GraphSnapshot> {
            bail!("graph offline")
        }
        async fn read_graph(&self) -> anyhow::Result<GraphSnapshot> {
            bail!("graph offline")
        }
    }

    fn gate() -> RecencyGate {
        RecencyGate::fixed(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    fn orchestrator(
        provider: Arc<EchoProvider>,
        memory: Arc<dyn GraphMemory>,
    ) -> DeepResearchOrchestrator {
        DeepResearchOrchestrator::new(
            provider,
            KnowledgeGraph::new(memory),
            gate(),
            Duration::from_secs(2),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_findings_are_recorded() {
        let provider = EchoProvider::new(Some("Pinecone launched serverless tier in October 2026"));
        let memory = Arc::new(LocalGraphMemory::new());
        let mut orchestrator = orchestrator(provider.clone(), memory.clone());
        let mut state = ResearchState::new();

        orchestrator
            .run("Pinecone", "market strategy", Duration::from_secs(10), &mut state)
            .await
            .unwrap();

        assert_eq!(state.iteration_count, 5);
        assert_eq!(state.findings.len(), 5);
        assert_eq!(state.metrics.total_tool_calls, 15);
        assert_eq!(state.metrics.recency_filtered, 0);
        assert_eq!(state.metrics.kg_reads, 1);
        assert_eq!(state.metrics.kg_writes, 5);

        // 同一信号文本映射到同一实体名，只保留第一次写入
        let graph = memory.read_graph().await.unwrap();
        let findings = graph
            .entities
            .iter()
            .filter(|e| e.entity_type.ends_with("_FINDING"))
            .count();
        assert_eq!(findings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_graph_write_failure_keeps_findings() {
        let provider = EchoProvider::new(Some("Pinecone launched serverless tier in October 2026"));
        let mut orchestrator = orchestrator(provider, Arc::new(OfflineGraph));
        let mut state = ResearchState::new();

        orchestrator
            .run("Pinecone", "market strategy", Duration::from_secs(4), &mut state)
            .await
            .unwrap();

        assert_eq!(state.iteration_count, 2);
        assert_eq!(state.findings.len(), 2);
        assert_eq!(state.metrics.kg_writes, 0);
        assert_eq!(state.metrics.kg_reads, 1);
        assert_eq!(state.metrics.total_tool_calls, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_findings_are_filtered() {
        let provider = EchoProvider::new(Some("Old news from 2019"));
        let memory = Arc::new(LocalGraphMemory::new());
        let mut orchestrator = orchestrator(provider, memory.clone());
        let mut state = ResearchState::new();

        orchestrator
            .run("Pinecone", "market strategy", Duration::from_secs(6), &mut state)
            .await
            .unwrap();

        assert_eq!(state.iteration_count, 3);
        assert!(state.findings.is_empty());
        assert_eq!(state.metrics.recency_filtered, 3);
        assert_eq!(state.metrics.kg_writes, 0);
        assert!(memory.read_graph().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_results_produce_nothing() {
        let provider = EchoProvider::new(None);
        let mut orchestrator = orchestrator(provider, Arc::new(LocalGraphMemory::new()));
        let mut state = ResearchState::new();

        orchestrator
            .run("Pinecone", "market strategy", Duration::from_secs(4), &mut state)
            .await
            .unwrap();

        assert_eq!(state.iteration_count, 2);
        assert!(state.findings.is_empty());
        // 每轮只调用了第一个工具
        assert_eq!(state.metrics.total_tool_calls, 2);
        assert_eq!(state.metrics.recency_filtered, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_rotates_every_third_iteration() {
        let provider = EchoProvider::new(Some("new launch 2026"));
        let mut orchestrator = orchestrator(provider.clone(), Arc::new(LocalGraphMemory::new()));
        let mut state = ResearchState::new();

        orchestrator
            .run("Chroma", "market strategy", Duration::from_secs(14), &mut state)
            .await
            .unwrap();

        let focuses: Vec<String> = provider
            .first_queries()
            .iter()
            .map(|q| {
                q.trim_start_matches("Chroma ")
                    .split(" since ")
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        assert_eq!(
            focuses,
            vec![
                "market strategy",
                "market strategy",
                "market strategy",
                "market expansion",
                "market expansion",
                "market expansion",
                "funding",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tools_never_repeat_within_a_cycle() {
        let provider = EchoProvider::new(Some("new launch 2026"));
        let mut orchestrator = orchestrator(provider.clone(), Arc::new(LocalGraphMemory::new()));
        let mut state = ResearchState::new();

        orchestrator
            .run("Chroma", "funding", Duration::from_secs(12), &mut state)
            .await
            .unwrap();

        let queries = provider.queries.lock().unwrap();
        for cycle in queries.chunks(3) {
            let mut ids: Vec<_> = cycle.iter().map(|(id, _)| *id).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), 3);
        }
        for id in CapabilityId::ALL {
            assert_eq!(state.metrics.calls_by_capability.get(id.as_str()), Some(&6));
        }
    }

    #[test]
    fn test_next_focus_wraps() {
        assert_eq!(next_focus(3), "market expansion");
        assert_eq!(next_focus(6), "funding");
        assert_eq!(next_focus(9), "pricing strategy");
        assert_eq!(next_focus(24), "product launches");
    }
}
