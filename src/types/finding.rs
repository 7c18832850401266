use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 情报分类
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCategory {
    Pricing,
    Product,
    People,
    Sentiment,
    Strategy,
}

impl FindingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCategory::Pricing => "PRICING",
            FindingCategory::Product => "PRODUCT",
            FindingCategory::People => "PEOPLE",
            FindingCategory::Sentiment => "SENTIMENT",
            FindingCategory::Strategy => "STRATEGY",
        }
    }
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 置信度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "HIGH"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::Low => write!(f, "LOW"),
        }
    }
}

/// 影响等级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Impact {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Impact::Critical => write!(f, "CRITICAL"),
            Impact::High => write!(f, "HIGH"),
            Impact::Medium => write!(f, "MEDIUM"),
            Impact::Low => write!(f, "LOW"),
        }
    }
}

/// 证据，归属于唯一的Finding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    /// 产出该证据的能力标识
    pub source: String,
    pub snippet: String,
    /// 可信度，0-100
    pub credibility: u8,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Evidence {
    pub fn new(source: impl Into<String>, snippet: impl Into<String>, credibility: u8) -> Self {
        Self {
            source: source.into(),
            snippet: snippet.into(),
            credibility: credibility.min(100),
            timestamp: Utc::now(),
            url: None,
        }
    }
}

/// 一条带证据的战略情报
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub id: String,
    pub category: FindingCategory,
    pub signal: String,
    pub evidence: Vec<Evidence>,
    pub confidence: Confidence,
    pub impact: Impact,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub related_findings: Vec<String>,
}

impl Finding {
    pub fn new(
        category: FindingCategory,
        signal: String,
        evidence: Vec<Evidence>,
        confidence: Confidence,
        impact: Impact,
    ) -> Self {
        Self {
            id: format!("f-{}", Uuid::new_v4().simple()),
            category,
            signal,
            evidence,
            confidence,
            impact,
            timestamp: Utc::now(),
            related_findings: Vec::new(),
        }
    }
}

/// 假设验证状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Confirmed,
    Refuted,
    #[default]
    Pending,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStatus::Confirmed => write!(f, "CONFIRMED"),
            ValidationStatus::Refuted => write!(f, "REFUTED"),
            ValidationStatus::Pending => write!(f, "PENDING"),
        }
    }
}

/// 战略假设，生命周期完全由知识图谱层管理
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hypothesis {
    pub claim: String,
    pub evidence_ids: Vec<String>,
    pub validation_status: ValidationStatus,
    pub implications: String,
}

/// 从图谱中识别出的模式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pattern {
    pub description: String,
    pub entities: Vec<String>,
    /// 0-100
    pub confidence: u8,
}

impl Pattern {
    pub fn new(description: String, entities: Vec<String>, confidence: u32) -> Self {
        Self {
            description,
            entities,
            confidence: confidence.min(100) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_are_bounded() {
        assert_eq!(Evidence::new("exa", "snippet", 250).credibility, 100);
        assert_eq!(Pattern::new("p".into(), vec![], 400).confidence, 100);
        assert_eq!(Pattern::new("p".into(), vec![], 60).confidence, 60);
    }

    #[test]
    fn test_category_serializes_upper_case() {
        let json = serde_json::to_string(&FindingCategory::Pricing).unwrap();
        assert_eq!(json, "\"PRICING\"");
        assert_eq!(Impact::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_new_finding_has_unique_id_and_no_relations() {
        let a = Finding::new(
            FindingCategory::Strategy,
            "A".into(),
            vec![],
            Confidence::High,
            Impact::Medium,
        );
        let b = Finding::new(
            FindingCategory::Strategy,
            "B".into(),
            vec![],
            Confidence::High,
            Impact::Medium,
        );
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("f-"));
        assert!(a.related_findings.is_empty());
    }
}
