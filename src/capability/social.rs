//! 社交信号检索客户端

use serde_json::{Value, json};
use std::time::Duration;

use super::CapabilityError;

/// 社交平台信号检索
pub struct SocialSearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    call_timeout: Duration,
}

impl SocialSearchClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, call_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            call_timeout,
        }
    }

    /// 检索 `since` 之后的社交信号，返回回复中的首段文本
    pub async fn search(&self, query: &str, since: &str) -> Result<Option<String>, CapabilityError> {
        let body = json!({
            "model": self.model,
            "input": [{
                "role": "user",
                "content": format!("Search X/Twitter for: {}. Focus ONLY on posts since {}.", query, since)
            }],
            "tools": [{ "type": "x_search" }]
        });

        let response: Value = self
            .http
            .post(format!("{}/responses", self.base_url))
            .timeout(self.call_timeout)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(extract_output_text(&response))
    }
}

fn extract_output_text(response: &Value) -> Option<String> {
    response
        .pointer("/output/0/content/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}
