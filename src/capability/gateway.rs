//! 工具网关客户端 - 基于 JSON-RPC 2.0 的 MCP Streamable HTTP 传输
//!
//! 网关只是内部传输细节，上层通过 [`CapabilityProvider`](super::CapabilityProvider)
//! 与 [`GraphMemory`](crate::memory::GraphMemory) 等窄接口访问。

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::CapabilityError;

const PROTOCOL_VERSION: &str = "2025-03-26";
const SESSION_HEADER: &str = "mcp-session-id";
const MAX_TOOL_PAGES: usize = 32;

/// JSON-RPC 2.0 请求
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    method: &'a str,
    params: Value,
}

/// JSON-RPC 2.0 响应
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    id: Option<u64>,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// 工具网关客户端
pub struct McpGateway {
    http: reqwest::Client,
    url: String,
    token: String,
    session_id: Option<String>,
    next_id: AtomicU64,
    call_timeout: Duration,
}

impl McpGateway {
    /// 连接网关并完成初始化握手
    pub async fn connect(
        url: &str,
        token: &str,
        call_timeout: Duration,
    ) -> Result<Self, CapabilityError> {
        let mut gateway = Self {
            http: reqwest::Client::new(),
            url: url.to_string(),
            token: token.to_string(),
            session_id: None,
            next_id: AtomicU64::new(1),
            call_timeout,
        };

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": { "name": "signl", "version": env!("CARGO_PKG_VERSION") }
        });
        let response = gateway.post("initialize", Some(gateway.next_id()), params).await?;
        gateway.session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Self::decode(response).await?;

        gateway
            .post("notifications/initialized", None, json!({}))
            .await?;
        debug!("🔌 工具网关已连接: {}", gateway.url);
        Ok(gateway)
    }

    /// 列出网关暴露的全部工具名，按 `nextCursor` 逐页读取
    pub async fn list_tools(&self) -> Result<Vec<String>, CapabilityError> {
        let mut names = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_TOOL_PAGES {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let result = self.request("tools/list", params).await?;
            let (page, next) = tool_page(&result);
            names.extend(page);

            match next {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => return Ok(names),
            }
        }

        warn!("⚠️ 工具列表超过 {} 页，后续页已忽略", MAX_TOOL_PAGES);
        Ok(names)
    }

    /// 调用指定工具，返回结构化结果
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, CapabilityError> {
        let result = self
            .request(
                "tools/call",
                json!({ "name": name, "arguments": arguments }),
            )
            .await?;

        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Err(CapabilityError::ToolFailed {
                tool: name.to_string(),
                message: super::first_text_content(&result).unwrap_or_default(),
            });
        }
        Ok(result)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, CapabilityError> {
        let response = self.post(method, Some(self.next_id()), params).await?;
        Self::decode(response).await
    }

    async fn post(
        &self,
        method: &str,
        id: Option<u64>,
        params: Value,
    ) -> Result<reqwest::Response, CapabilityError> {
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let mut builder = self
            .http
            .post(&self.url)
            .timeout(self.call_timeout)
            .header("Accept", "application/json, text/event-stream")
            .json(&body);
        if !self.token.is_empty() {
            builder = builder.bearer_auth(&self.token);
        }
        if let Some(session_id) = &self.session_id {
            builder = builder.header(SESSION_HEADER, session_id);
        }

        Ok(builder.send().await?.error_for_status()?)
    }

    async fn decode(response: reqwest::Response) -> Result<Value, CapabilityError> {
        let is_stream = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("text/event-stream"));
        let body = response.text().await?;
        parse_body(&body, is_stream)
    }
}

/// 取出一页 `tools/list` 结果中的工具名与下一页游标
fn tool_page(result: &Value) -> (Vec<String>, Option<String>) {
    let names = result
        .get("tools")
        .and_then(Value::as_array)
        .map(|tools| {
            tools
                .iter()
                .filter_map(|tool| tool.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let next = result
        .get("nextCursor")
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(str::to_string);
    (names, next)
}

/// 解析 JSON 或 SSE 形式的响应体
fn parse_body(body: &str, is_stream: bool) -> Result<Value, CapabilityError> {
    let payload = if is_stream {
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim)
            .filter(|data| !data.is_empty())
            .last()
            .ok_or(CapabilityError::NoResult)?
            .to_string()
    } else {
        body.to_string()
    };

    let response: JsonRpcResponse = serde_json::from_str(&payload)?;
    if let Some(error) = response.error {
        return Err(CapabilityError::Gateway {
            code: error.code,
            message: error.message,
        });
    }
    response.result.ok_or(CapabilityError::NoResult)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json_result() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#;
        let value = parse_body(body, false).unwrap();
        assert!(value.get("tools").is_some());
    }

    #[test]
    fn test_parse_event_stream_takes_last_data_line() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"n\":1}}\n\ndata: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"n\":2}}\n";
        let value = parse_body(body, true).unwrap();
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32601,"message":"Method not found"}}"#;
        match parse_body(body, false) {
            Err(CapabilityError::Gateway { code, message }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_tool_page_reads_names_and_cursor() {
        let (names, next) = tool_page(&json!({
            "tools": [{ "name": "exa-web_search_exa" }, { "description": "unnamed" }],
            "nextCursor": "page-2"
        }));
        assert_eq!(names, vec!["exa-web_search_exa"]);
        assert_eq!(next.as_deref(), Some("page-2"));

        let (names, next) = tool_page(&json!({ "tools": [{ "name": "memory-read_graph" }] }));
        assert_eq!(names, vec!["memory-read_graph"]);
        assert!(next.is_none());

        let (_, next) = tool_page(&json!({ "tools": [], "nextCursor": "" }));
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_list_tools_follows_next_cursor() {
        let url = fake::serve_tools(vec![
            vec!["exa-web_search_exa"],
            vec!["perplexityAsk-perplexity_reason"],
            vec!["memory-read_graph", "memory-create_entities"],
        ])
        .await;

        let gateway = McpGateway::connect(&url, "", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(
            gateway.list_tools().await.unwrap(),
            vec![
                "exa-web_search_exa",
                "perplexityAsk-perplexity_reason",
                "memory-read_graph",
                "memory-create_entities",
            ]
        );
    }

    #[test]
    fn test_parse_empty_stream() {
        assert!(matches!(
            parse_body("event: ping\n", true),
            Err(CapabilityError::NoResult)
        ));
    }
}
