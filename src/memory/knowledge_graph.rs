//! 知识图谱客户端 - 把Finding、假设与模式映射到图谱实体和关系上

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::GraphMemory;
use crate::types::finding::{Evidence, Finding, Hypothesis, Pattern};
use crate::types::graph::{GraphEntity, GraphRelation, GraphSnapshot, ObservationBatch};
use crate::utils::text::sanitize_entity_name;

pub const SUPPORTS_HYPOTHESIS: &str = "supports_hypothesis";
pub const REFUTES_HYPOTHESIS: &str = "refutes_hypothesis";

const FINDING_TYPE_SUFFIX: &str = "_FINDING";
const HYPOTHESIS_TYPE: &str = "STRATEGIC_HYPOTHESIS";
const QUESTION_STOPWORDS: [&str; 5] = ["about", "what", "when", "where", "which"];
const PATTERN_MIN_FINDINGS: usize = 3;

/// 已有知识检索结果
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeLookup {
    pub exists: bool,
    pub entity: Option<GraphEntity>,
    pub confidence: String,
}

impl KnowledgeLookup {
    fn not_found() -> Self {
        Self {
            exists: false,
            entity: None,
            confidence: String::from("UNKNOWN"),
        }
    }
}

/// 假设的支持/反驳证据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HypothesisEvidence {
    pub supporting: Vec<GraphRelation>,
    pub refuting: Vec<GraphRelation>,
    /// 支持数 - 反驳数
    pub strength: i64,
}

/// 知识图谱客户端，所有写操作均为尽力而为
#[derive(Clone)]
pub struct KnowledgeGraph {
    memory: Arc<dyn GraphMemory>,
}

impl KnowledgeGraph {
    pub fn new(memory: Arc<dyn GraphMemory>) -> Self {
        Self { memory }
    }

    /// 记录一条Finding：实体、两条关系、逐条证据观察
    ///
    /// 任一子调用失败只记录日志；返回实体是否创建成功。
    /// 实体名由信号文本有损截断得到，不同Finding可能同名，同名时以先写入者为准。
    pub async fn record_finding(&self, finding: &Finding, competitor: &str, focus: &str) -> bool {
        debug!("   📝 记录Finding: {}", finding.signal);
        let entity_name = sanitize_entity_name(&finding.signal);

        let entity = GraphEntity {
            name: entity_name.clone(),
            entity_type: format!("{}{}", finding.category, FINDING_TYPE_SUFFIX),
            observations: vec![
                format!("Category: {}", finding.category),
                format!("Confidence: {}", finding.confidence),
                format!("Impact: {}", finding.impact),
                format!("Discovered: {}", finding.timestamp.to_rfc3339()),
                format!("Signal: {}", finding.signal),
            ],
        };
        let created = match self.memory.create_entities(vec![entity]).await {
            Ok(()) => true,
            Err(e) => {
                warn!("   ⚠️ 图谱实体写入失败: {:#}", e);
                false
            }
        };

        let relations = vec![
            Self::relation(&entity_name, competitor, "discovered_about"),
            Self::relation(&entity_name, focus, "relates_to"),
        ];
        if let Err(e) = self.memory.create_relations(relations).await {
            warn!("   ⚠️ 图谱关系写入失败: {:#}", e);
        }

        for evidence in &finding.evidence {
            self.add_evidence(&entity_name, evidence).await;
        }

        if created {
            debug!("   ✓ 图谱实体已创建: {}", entity_name);
        }
        created
    }

    async fn add_evidence(&self, entity_name: &str, evidence: &Evidence) {
        let mut contents = vec![
            format!("Evidence from {}: {}", evidence.source, evidence.snippet),
            format!("Source credibility: {}%", evidence.credibility),
            format!("Timestamp: {}", evidence.timestamp.to_rfc3339()),
        ];
        if let Some(url) = &evidence.url {
            contents.push(format!("URL: {}", url));
        }

        let batch = ObservationBatch {
            entity_name: entity_name.to_string(),
            contents,
        };
        if let Err(e) = self.memory.add_observations(vec![batch]).await {
            warn!("   ⚠️ 证据写入失败: {:#}", e);
        }
    }

    /// 按主题检索已有知识
    pub async fn check_existing_knowledge(&self, topic: &str) -> KnowledgeLookup {
        debug!("   🔍 检索已有知识: \"{}\"", topic);
        match self.memory.search_nodes(topic).await {
            Ok(snapshot) => match snapshot.entities.into_iter().next() {
                Some(entity) => KnowledgeLookup {
                    exists: true,
                    confidence: extract_confidence(&entity),
                    entity: Some(entity),
                },
                None => KnowledgeLookup::not_found(),
            },
            Err(e) => {
                debug!("   已有知识检索失败: {:#}", e);
                KnowledgeLookup::not_found()
            }
        }
    }

    /// 创建战略假设实体，返回实体名
    pub async fn create_hypothesis(&self, hypothesis: &Hypothesis) -> anyhow::Result<String> {
        info!("💡 创建假设: {}", hypothesis.claim);
        let entity_name = sanitize_entity_name(&format!("HYPOTHESIS_{}", hypothesis.claim));
        let entity = GraphEntity {
            name: entity_name.clone(),
            entity_type: HYPOTHESIS_TYPE.to_string(),
            observations: vec![
                format!("Claim: {}", hypothesis.claim),
                format!("Implications: {}", hypothesis.implications),
                format!("Status: {}", hypothesis.validation_status),
                format!("Created: {}", chrono::Utc::now().to_rfc3339()),
            ],
        };
        self.memory.create_entities(vec![entity]).await?;
        Ok(entity_name)
    }

    /// 将实体作为假设的支持或反驳证据关联起来
    pub async fn link_evidence(&self, entity_name: &str, hypothesis: &str, supports: bool) {
        let relation_type = if supports {
            SUPPORTS_HYPOTHESIS
        } else {
            REFUTES_HYPOTHESIS
        };
        if let Err(e) = self
            .memory
            .create_relations(vec![Self::relation(entity_name, hypothesis, relation_type)])
            .await
        {
            warn!("   ⚠️ 假设证据关联失败: {:#}", e);
        }
    }

    /// 汇总假设的支持度
    pub async fn get_hypothesis_evidence(&self, hypothesis: &str) -> HypothesisEvidence {
        let snapshot = match self.memory.open_nodes(&[hypothesis.to_string()]).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("   假设读取失败: {:#}", e);
                return HypothesisEvidence::default();
            }
        };

        let (supporting, refuting): (Vec<_>, Vec<_>) = snapshot
            .relations
            .into_iter()
            .filter(|r| r.relation_type == SUPPORTS_HYPOTHESIS || r.relation_type == REFUTES_HYPOTHESIS)
            .partition(|r| r.relation_type == SUPPORTS_HYPOTHESIS);
        let strength = supporting.len() as i64 - refuting.len() as i64;

        HypothesisEvidence {
            supporting,
            refuting,
            strength,
        }
    }

    /// 用自然语言问题查询图谱，返回原始JSON文本或提示语
    pub async fn query_strategic(&self, question: &str) -> anyhow::Result<String> {
        debug!("   ❓ 战略查询: \"{}\"", question);
        let names = key_entities_from_question(question);

        if names.is_empty() {
            let snapshot = self.memory.search_nodes(question).await?;
            return Ok(render_snapshot(&snapshot, "No relevant knowledge found"));
        }

        let snapshot = self.memory.open_nodes(&names).await?;
        Ok(render_snapshot(&snapshot, "Entity not found"))
    }

    /// 读取完整图谱，失败时返回空图
    pub async fn get_full_context(&self) -> GraphSnapshot {
        debug!("   📚 读取完整知识图谱...");
        self.memory.read_graph().await.unwrap_or_else(|e| {
            warn!("   ⚠️ 图谱读取失败: {:#}", e);
            GraphSnapshot::default()
        })
    }

    /// 按Finding类别统计，每个达到阈值的类别产出一个模式
    pub async fn detect_patterns(&self) -> Vec<Pattern> {
        let graph = self.get_full_context().await;
        patterns_from(&graph)
    }

    fn relation(from: &str, to: &str, relation_type: &str) -> GraphRelation {
        GraphRelation {
            from: from.to_string(),
            to: to.to_string(),
            relation_type: relation_type.to_string(),
        }
    }
}

fn patterns_from(graph: &GraphSnapshot) -> Vec<Pattern> {
    // 保持类别首次出现的顺序
    let mut by_category: Vec<(&str, Vec<String>)> = Vec::new();
    for entity in &graph.entities {
        let Some(category) = entity.entity_type.strip_suffix(FINDING_TYPE_SUFFIX) else {
            continue;
        };
        match by_category.iter_mut().find(|(c, _)| *c == category) {
            Some((_, names)) => names.push(entity.name.clone()),
            None => by_category.push((category, vec![entity.name.clone()])),
        }
    }

    by_category
        .into_iter()
        .filter(|(_, names)| names.len() >= PATTERN_MIN_FINDINGS)
        .map(|(category, names)| {
            let count = names.len();
            Pattern::new(
                format!("High activity in {} - {} signals detected", category, count),
                names,
                (count as u32).saturating_mul(20).min(90),
            )
        })
        .collect()
}

fn extract_confidence(entity: &GraphEntity) -> String {
    entity
        .observations
        .iter()
        .find_map(|o| o.split_once("Confidence:").map(|(_, rest)| rest.trim().to_string()))
        .unwrap_or_else(|| String::from("UNKNOWN"))
}

fn key_entities_from_question(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split(' ')
        .filter(|word| word.chars().count() > 5 && !QUESTION_STOPWORDS.contains(word))
        .take(3)
        .map(str::to_string)
        .collect()
}

fn render_snapshot(snapshot: &GraphSnapshot, empty_message: &str) -> String {
    if snapshot.is_empty() {
        return empty_message.to_string();
    }
    serde_json::to_string(snapshot).unwrap_or_else(|_| empty_message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::LocalGraphMemory;
    use crate::types::finding::{Confidence, FindingCategory, Impact, ValidationStatus};
    use anyhow::{Result, bail};
    use async_trait::async_trait;

    /// 所有操作都失败的图谱
    struct BrokenGraph;

    #[async_trait]
    impl GraphMemory for BrokenGraph {
        async fn create_entities(&self, _: Vec<GraphEntity>) -> Result<()> {
            bail!("offline")
        }
        async fn create_relations(&self, _: Vec<GraphRelation>) -> Result<()> {
            bail!("offline")
        }
        async fn add_observations(&self, _: Vec<ObservationBatch>) -> Result<()> {
            bail!("offline")
        }
        async fn search_nodes(&self, _: &str) -> Result<GraphSnapshot> {
            bail!("offline")
        }
        async fn open_nodes(&self, _: &[String]) -> Result<GraphSnapshot> {
            bail!("offline")
        }
        async fn read_graph(&self) -> Result<GraphSnapshot> {
            bail!("offline")
        }
    }

    fn local() -> (Arc<LocalGraphMemory>, KnowledgeGraph) {
        let memory = Arc::new(LocalGraphMemory::new());
        let graph = KnowledgeGraph::new(memory.clone());
        (memory, graph)
    }

    fn finding(category: FindingCategory, signal: &str) -> Finding {
        let mut evidence = Evidence::new("exa", "Pinecone announced new pricing", 85);
        evidence.url = Some("https://example.com/post".to_string());
        Finding::new(
            category,
            signal.to_string(),
            vec![evidence, Evidence::new("perplexity", "analysis", 90)],
            Confidence::High,
            Impact::Critical,
        )
    }

    fn typed_entity(name: &str, entity_type: &str) -> GraphEntity {
        GraphEntity {
            name: name.to_string(),
            entity_type: entity_type.to_string(),
            observations: vec![],
        }
    }

    #[tokio::test]
    async fn test_record_finding_writes_entity_relations_and_evidence() {
        let (memory, graph) = local();
        let finding = finding(FindingCategory::Pricing, "Pinecone: cut prices by 30%!");

        assert!(graph.record_finding(&finding, "Pinecone", "pricing strategy").await);

        let snapshot = memory.read_graph().await.unwrap();
        assert_eq!(snapshot.entities.len(), 1);
        let entity = &snapshot.entities[0];
        assert_eq!(entity.name, "Pinecone_cut_prices_by_30");
        assert_eq!(entity.entity_type, "PRICING_FINDING");
        assert!(entity.observations.contains(&"Category: PRICING".to_string()));
        assert!(entity.observations.contains(&"Impact: CRITICAL".to_string()));
        assert!(
            entity
                .observations
                .contains(&"Evidence from exa: Pinecone announced new pricing".to_string())
        );
        assert!(entity.observations.contains(&"Source credibility: 90%".to_string()));
        assert!(
            entity
                .observations
                .contains(&"URL: https://example.com/post".to_string())
        );

        let kinds: Vec<_> = snapshot
            .relations
            .iter()
            .map(|r| (r.to.as_str(), r.relation_type.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("Pinecone", "discovered_about"),
                ("pricing strategy", "relates_to")
            ]
        );
    }

    #[tokio::test]
    async fn test_record_finding_failure_is_swallowed() {
        let graph = KnowledgeGraph::new(Arc::new(BrokenGraph));
        let finding = finding(FindingCategory::Product, "anything");
        assert!(!graph.record_finding(&finding, "Pinecone", "product").await);
        assert!(graph.get_full_context().await.is_empty());
        assert!(graph.detect_patterns().await.is_empty());
        assert!(!graph.check_existing_knowledge("x").await.exists);
    }

    #[tokio::test]
    async fn test_check_existing_knowledge_extracts_confidence() {
        let (_, graph) = local();
        graph
            .record_finding(
                &finding(FindingCategory::Pricing, "Pinecone pricing change"),
                "Pinecone",
                "pricing strategy",
            )
            .await;

        let lookup = graph.check_existing_knowledge("pinecone pricing").await;
        assert!(lookup.exists);
        assert_eq!(lookup.confidence, "HIGH");

        let missing = graph.check_existing_knowledge("weaviate").await;
        assert_eq!(missing, KnowledgeLookup::not_found());
    }

    #[test]
    fn test_extract_confidence_defaults_to_unknown() {
        let entity = typed_entity("A", "PRICING_FINDING");
        assert_eq!(extract_confidence(&entity), "UNKNOWN");
    }

    #[test]
    fn test_detect_patterns_thresholds() {
        let graph = GraphSnapshot {
            entities: vec![
                typed_entity("p1", "PRICING_FINDING"),
                typed_entity("d1", "PRODUCT_FINDING"),
                typed_entity("p2", "PRICING_FINDING"),
                typed_entity("h1", "STRATEGIC_HYPOTHESIS"),
                typed_entity("p3", "PRICING_FINDING"),
            ],
            relations: vec![],
        };

        let patterns = patterns_from(&graph);
        assert_eq!(patterns.len(), 1);
        assert_eq!(
            patterns[0].description,
            "High activity in PRICING - 3 signals detected"
        );
        assert_eq!(patterns[0].entities, vec!["p1", "p2", "p3"]);
        assert_eq!(patterns[0].confidence, 60);
    }

    #[test]
    fn test_pattern_confidence_caps_at_90() {
        let graph = GraphSnapshot {
            entities: (0..7)
                .map(|i| typed_entity(&format!("s{}", i), "SENTIMENT_FINDING"))
                .collect(),
            relations: vec![],
        };
        assert_eq!(patterns_from(&graph)[0].confidence, 90);
    }

    #[tokio::test]
    async fn test_hypothesis_strength() {
        let (_, graph) = local();
        let hypothesis = Hypothesis {
            claim: "Pinecone is moving down-market".to_string(),
            evidence_ids: vec![],
            validation_status: ValidationStatus::Pending,
            implications: "Pressure on SMB pricing".to_string(),
        };

        let name = graph.create_hypothesis(&hypothesis).await.unwrap();
        assert_eq!(name, "HYPOTHESISPinecone_is_moving_downmarket");

        graph.link_evidence("f1", &name, true).await;
        graph.link_evidence("f2", &name, true).await;
        graph.link_evidence("f3", &name, false).await;

        let evidence = graph.get_hypothesis_evidence(&name).await;
        assert_eq!(evidence.supporting.len(), 2);
        assert_eq!(evidence.refuting.len(), 1);
        assert_eq!(evidence.strength, 1);
    }

    #[test]
    fn test_key_entities_from_question() {
        assert_eq!(
            key_entities_from_question("What is Pinecone's pricing strategy about enterprise tiers"),
            vec!["pinecone's", "pricing", "strategy"]
        );
        assert!(key_entities_from_question("what about where").is_empty());
    }

    #[tokio::test]
    async fn test_query_strategic_messages() {
        let (_, graph) = local();
        assert_eq!(
            graph.query_strategic("any news").await.unwrap(),
            "No relevant knowledge found"
        );
        assert_eq!(
            graph.query_strategic("pricing changes").await.unwrap(),
            "Entity not found"
        );
    }
}
