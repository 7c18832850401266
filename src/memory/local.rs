//! 进程内图谱记忆 - 不持久化，供测试与库调用方装配 `MissionServices` 使用

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

use super::GraphMemory;
use crate::types::graph::{GraphEntity, GraphRelation, GraphSnapshot, ObservationBatch};

#[derive(Debug, Default)]
pub struct LocalGraphMemory {
    graph: RwLock<GraphSnapshot>,
}

impl LocalGraphMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 截取包含指定实体的子图，关系只要有一端命中即保留
    fn subgraph(graph: &GraphSnapshot, keep: impl Fn(&GraphEntity) -> bool) -> GraphSnapshot {
        let entities: Vec<GraphEntity> = graph.entities.iter().filter(|e| keep(*e)).cloned().collect();
        let names: HashSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        let relations = graph
            .relations
            .iter()
            .filter(|r| names.contains(r.from.as_str()) || names.contains(r.to.as_str()))
            .cloned()
            .collect();
        GraphSnapshot {
            entities,
            relations,
        }
    }
}

#[async_trait]
impl GraphMemory for LocalGraphMemory {
    /// 同名实体保留先写入者
    async fn create_entities(&self, entities: Vec<GraphEntity>) -> Result<()> {
        let mut graph = self.graph.write().await;
        for entity in entities {
            if !graph.entities.iter().any(|e| e.name == entity.name) {
                graph.entities.push(entity);
            }
        }
        Ok(())
    }

    async fn create_relations(&self, relations: Vec<GraphRelation>) -> Result<()> {
        let mut graph = self.graph.write().await;
        for relation in relations {
            if !graph.relations.contains(&relation) {
                graph.relations.push(relation);
            }
        }
        Ok(())
    }

    async fn add_observations(&self, observations: Vec<ObservationBatch>) -> Result<()> {
        let mut graph = self.graph.write().await;
        for batch in observations {
            let Some(entity) = graph
                .entities
                .iter_mut()
                .find(|e| e.name == batch.entity_name)
            else {
                bail!("Entity with name {} not found", batch.entity_name);
            };
            for content in batch.contents {
                if !entity.observations.contains(&content) {
                    entity.observations.push(content);
                }
            }
        }
        Ok(())
    }

    async fn search_nodes(&self, query: &str) -> Result<GraphSnapshot> {
        let query = query.to_lowercase();
        let graph = self.graph.read().await;
        Ok(Self::subgraph(&graph, |entity| {
            entity.name.to_lowercase().contains(&query)
                || entity.entity_type.to_lowercase().contains(&query)
                || entity
                    .observations
                    .iter()
                    .any(|o| o.to_lowercase().contains(&query))
        }))
    }

    async fn open_nodes(&self, names: &[String]) -> Result<GraphSnapshot> {
        let graph = self.graph.read().await;
        Ok(Self::subgraph(&graph, |entity| names.contains(&entity.name)))
    }

    async fn read_graph(&self) -> Result<GraphSnapshot> {
        Ok(self.graph.read().await.clone())
    }
}
