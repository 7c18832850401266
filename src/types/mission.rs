use serde::{Deserialize, Serialize};

/// 任务发起人身份
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FounderIdentity {
    pub full_name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
}

/// 公司档案
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub name: String,
    #[serde(default)]
    pub website_domain: String,
    #[serde(default)]
    pub founding_year: u16,
    #[serde(default)]
    pub headquarters_location: String,
    #[serde(default)]
    pub employee_count_range: String,
    #[serde(default)]
    pub primary_industry: String,
    #[serde(default)]
    pub business_model: String,
    #[serde(default)]
    pub current_funding_stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_funding_raised: Option<String>,
}

/// 战略北极星
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategicNorthStar {
    pub core_value_proposition: String,
    pub problem_being_solved: String,
    pub ideal_customer_profile: String,
    pub north_star_metric: String,
    pub pricing_strategy: String,
    pub primary_gtm_motion: String,
    pub target_geography: Vec<String>,
    pub positioning: String,
    pub unfair_advantage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_partnerships: Option<Vec<String>>,
}

/// 产品细节
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDetails {
    pub primary_feature_set: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_stack_core: Option<Vec<String>>,
    pub compliance_requirements: Vec<String>,
    pub integrations_list: Vec<String>,
    pub deployment_method: String,
    pub mobile_app_available: bool,
    pub api_first: bool,
}

/// 风险与焦虑画像
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AnxietyProfile {
    pub biggest_fear: String,
    pub what_keeps_you_up_at_night: String,
    pub known_weakness_internal: String,
    pub top_reason_for_churn: String,
    pub top_reason_for_loss_in_sales: String,
}

/// 竞争对手情报目标
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorTargets {
    pub competitor_names: Vec<String>,
    #[serde(default)]
    pub specific_rumors_to_verify: Vec<String>,
    #[serde(default)]
    pub perceived_threat_level: String,
    #[serde(default)]
    pub specific_questions_for_agent: Vec<String>,
    #[serde(default)]
    pub blacklisted_domains: Vec<String>,
}

/// 输出偏好
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputPreferences {
    pub report_tone: String,
    pub include_raw_sources: bool,
    pub focus_areas: Vec<String>,
    pub language: String,
}

/// 任务上下文，一次任务内不可变
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MissionContext {
    pub identity: FounderIdentity,
    pub company: CompanyProfile,
    #[serde(default)]
    pub strategy: StrategicNorthStar,
    #[serde(default)]
    pub product: ProductDetails,
    #[serde(default)]
    pub anxiety: AnxietyProfile,
    pub targets: CompetitorTargets,
    #[serde(default)]
    pub output_preferences: OutputPreferences,
}

/// 任务输入校验错误
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MissionError {
    #[error("Missing 'identity.email'")]
    MissingEmail,
    #[error("Missing 'company.name'")]
    MissingCompanyName,
    #[error("At least one competitor name is required.")]
    NoCompetitors,
}

impl MissionContext {
    /// 校验触发任务所需的最少字段
    pub fn validate(&self) -> Result<(), MissionError> {
        if self.identity.email.trim().is_empty() {
            return Err(MissionError::MissingEmail);
        }
        if self.company.name.trim().is_empty() {
            return Err(MissionError::MissingCompanyName);
        }
        if self.competitors().next().is_none() {
            return Err(MissionError::NoCompetitors);
        }
        Ok(())
    }

    /// 有效的竞争对手名称（忽略空白项）
    pub fn competitors(&self) -> impl Iterator<Item = &str> {
        self.targets
            .competitor_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
    }

    pub fn primary_competitor(&self) -> &str {
        self.competitors().next().unwrap_or("")
    }
}
