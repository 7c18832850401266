use tracing::{debug, info};

use crate::memory::KnowledgeGraph;
use crate::mission::context::MissionMetrics;
use crate::types::finding::{Finding, Hypothesis, Pattern, ValidationStatus};

/// 进入关键路径的Finding上限
const MAX_CRITICAL_FINDINGS: usize = 15;

/// 针对任务问题从图谱中得到的答复
#[derive(Debug, Clone, PartialEq)]
pub struct StrategicAnswer {
    pub question: String,
    pub answer: String,
}

/// 关键路径分析结果
#[derive(Debug, Clone, Default)]
pub struct CriticalPath {
    pub critical_findings: Vec<Finding>,
    pub patterns: Vec<Pattern>,
    /// 由建议合成阶段填充
    pub recommendations: Vec<String>,
    pub strategic_answers: Vec<StrategicAnswer>,
}

/// 关键路径分析器
pub struct CriticalPathAnalyzer {
    graph: KnowledgeGraph,
}

impl CriticalPathAnalyzer {
    pub fn new(graph: KnowledgeGraph) -> Self {
        Self { graph }
    }

    pub async fn analyze(
        &self,
        findings: &[Finding],
        questions: &[String],
        metrics: &mut MissionMetrics,
    ) -> CriticalPath {
        info!("🎯 分析关键路径（{} 条Finding）", findings.len());

        let patterns = self.graph.detect_patterns().await;
        metrics.kg_reads += 1;
        for pattern in &patterns {
            self.track_hypothesis(pattern, metrics).await;
        }

        let mut strategic_answers = Vec::new();
        for question in questions {
            metrics.kg_reads += 1;
            match self.graph.query_strategic(question).await {
                Ok(answer) => strategic_answers.push(StrategicAnswer {
                    question: question.clone(),
                    answer,
                }),
                Err(e) => debug!("   战略问题查询失败: {:#}", e),
            }
        }

        CriticalPath {
            critical_findings: rank_findings(findings),
            patterns,
            recommendations: Vec::new(),
            strategic_answers,
        }
    }

    /// 将模式登记为待验证的假设，贡献实体作为支持证据
    async fn track_hypothesis(&self, pattern: &Pattern, metrics: &mut MissionMetrics) {
        let hypothesis = Hypothesis {
            claim: pattern.description.clone(),
            evidence_ids: pattern.entities.clone(),
            validation_status: ValidationStatus::Pending,
            implications: format!("Pattern confidence {}%", pattern.confidence),
        };
        let name = match self.graph.create_hypothesis(&hypothesis).await {
            Ok(name) => name,
            Err(e) => {
                debug!("   假设创建失败: {:#}", e);
                return;
            }
        };
        metrics.kg_writes += 1;

        for entity in &pattern.entities {
            self.graph.link_evidence(entity, &name, true).await;
        }

        let evidence = self.graph.get_hypothesis_evidence(&name).await;
        metrics.kg_reads += 1;
        info!("   💡 {} （支持度 {}）", pattern.description, evidence.strength);
    }
}

/// 按证据数量降序稳定排序，取前15条
fn rank_findings(findings: &[Finding]) -> Vec<Finding> {
    let mut ranked = findings.to_vec();
    ranked.sort_by(|a, b| b.evidence.len().cmp(&a.evidence.len()));
    ranked.truncate(MAX_CRITICAL_FINDINGS);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{GraphMemory, LocalGraphMemory};
    use crate::types::finding::{Confidence, Evidence, FindingCategory, Impact};
    use std::sync::Arc;

    fn finding(signal: &str, evidence_count: usize, category: FindingCategory) -> Finding {
        Finding::new(
            category,
            signal.to_string(),
            (0..evidence_count)
                .map(|i| Evidence::new("exa", format!("snippet {}", i), 85))
                .collect(),
            Confidence::High,
            Impact::Medium,
        )
    }

    #[test]
    fn test_rank_is_descending_and_stable() {
        let findings = vec![
            finding("a", 1, FindingCategory::Strategy),
            finding("b", 3, FindingCategory::Strategy),
            finding("c", 1, FindingCategory::Strategy),
            finding("d", 3, FindingCategory::Strategy),
            finding("e", 2, FindingCategory::Strategy),
        ];

        let signals: Vec<_> = rank_findings(&findings)
            .into_iter()
            .map(|f| f.signal)
            .collect();
        assert_eq!(signals, vec!["b", "d", "e", "a", "c"]);
    }

    #[test]
    fn test_rank_caps_at_fifteen() {
        let findings: Vec<_> = (0..20)
            .map(|i| finding(&format!("s{}", i), i % 4, FindingCategory::Pricing))
            .collect();
        let ranked = rank_findings(&findings);
        assert_eq!(ranked.len(), 15);
        assert!(
            ranked
                .windows(2)
                .all(|w| w[0].evidence.len() >= w[1].evidence.len())
        );
    }

    #[tokio::test]
    async fn test_analyze_detects_patterns_and_tracks_hypotheses() {
        let memory = Arc::new(LocalGraphMemory::new());
        let graph = KnowledgeGraph::new(memory.clone());
        let findings = vec![
            finding("Pinecone cut starter price", 3, FindingCategory::Pricing),
            finding("Pinecone added usage tier", 3, FindingCategory::Pricing),
            finding("Pinecone dropped free plan", 3, FindingCategory::Pricing),
            finding("Pinecone shipped new SDK", 3, FindingCategory::Product),
        ];
        for f in &findings {
            graph.record_finding(f, "Pinecone", "pricing strategy").await;
        }

        let analyzer = CriticalPathAnalyzer::new(graph);
        let mut metrics = MissionMetrics::default();
        let path = analyzer
            .analyze(
                &findings,
                &["Are they discounting enterprise plans?".to_string()],
                &mut metrics,
            )
            .await;

        assert_eq!(path.critical_findings.len(), 4);
        assert_eq!(path.patterns.len(), 1);
        assert_eq!(path.patterns[0].confidence, 60);
        assert!(path.recommendations.is_empty());
        assert_eq!(path.strategic_answers.len(), 1);
        // 读图谱 + 读假设证据 + 一个问题
        assert_eq!(metrics.kg_reads, 3);
        assert_eq!(metrics.kg_writes, 1);

        let snapshot = memory.read_graph().await.unwrap();
        assert!(
            snapshot
                .entities
                .iter()
                .any(|e| e.entity_type == "STRATEGIC_HYPOTHESIS")
        );
        let supports = snapshot
            .relations
            .iter()
            .filter(|r| r.relation_type == "supports_hypothesis")
            .count();
        assert_eq!(supports, 3);
    }
}
