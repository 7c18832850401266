//! 知识图谱记忆 - 跨研究周期的持久上下文

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::capability::{McpGateway, first_text_content};
use crate::types::graph::{GraphEntity, GraphRelation, GraphSnapshot, ObservationBatch};

pub mod knowledge_graph;
pub mod local;

pub use knowledge_graph::KnowledgeGraph;
pub use local::LocalGraphMemory;

/// 图谱记忆服务的类型化接口
#[async_trait]
pub trait GraphMemory: Send + Sync {
    async fn create_entities(&self, entities: Vec<GraphEntity>) -> Result<()>;

    async fn create_relations(&self, relations: Vec<GraphRelation>) -> Result<()>;

    async fn add_observations(&self, observations: Vec<ObservationBatch>) -> Result<()>;

    /// 按文本模糊检索
    async fn search_nodes(&self, query: &str) -> Result<GraphSnapshot>;

    /// 按名称打开实体及其关系
    async fn open_nodes(&self, names: &[String]) -> Result<GraphSnapshot>;

    async fn read_graph(&self) -> Result<GraphSnapshot>;
}

/// 基于网关 memory 服务的图谱记忆，工具名统一带 `memory-` 前缀
pub struct McpGraphMemory {
    gateway: Arc<McpGateway>,
}

impl McpGraphMemory {
    const TOOL_PREFIX: &'static str = "memory-";

    pub fn new(gateway: Arc<McpGateway>) -> Self {
        Self { gateway }
    }

    async fn call(&self, operation: &str, arguments: Value) -> Result<Value> {
        let tool = format!("{}{}", Self::TOOL_PREFIX, operation);
        self.gateway
            .call_tool(&tool, arguments)
            .await
            .with_context(|| format!("graph operation {} failed", tool))
    }

    async fn read<T: DeserializeOwned + Default>(
        &self,
        operation: &str,
        arguments: Value,
    ) -> Result<T> {
        let result = self.call(operation, arguments).await?;
        parse_text_payload(&result)
    }
}

/// 解析工具结果中的JSON文本，无文本时返回默认值
fn parse_text_payload<T: DeserializeOwned + Default>(result: &Value) -> Result<T> {
    match first_text_content(result) {
        Some(text) if !text.trim().is_empty() => {
            serde_json::from_str(&text).context("graph payload is not valid JSON")
        }
        _ => Ok(T::default()),
    }
}

#[async_trait]
impl GraphMemory for McpGraphMemory {
    async fn create_entities(&self, entities: Vec<GraphEntity>) -> Result<()> {
        self.call("create_entities", json!({ "entities": entities }))
            .await
            .map(|_| ())
    }

    async fn create_relations(&self, relations: Vec<GraphRelation>) -> Result<()> {
        self.call("create_relations", json!({ "relations": relations }))
            .await
            .map(|_| ())
    }

    async fn add_observations(&self, observations: Vec<ObservationBatch>) -> Result<()> {
        self.call("add_observations", json!({ "observations": observations }))
            .await
            .map(|_| ())
    }

    async fn search_nodes(&self, query: &str) -> Result<GraphSnapshot> {
        self.read("search_nodes", json!({ "query": query })).await
    }

    async fn open_nodes(&self, names: &[String]) -> Result<GraphSnapshot> {
        self.read("open_nodes", json!({ "names": names })).await
    }

    async fn read_graph(&self) -> Result<GraphSnapshot> {
        self.read("read_graph", json!({})).await
    }
}
