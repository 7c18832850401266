//! 周期任务模板与订阅者任务上下文

use crate::scheduler::RecurringJob;
use crate::types::mission::{
    AnxietyProfile, CompanyProfile, CompetitorTargets, FounderIdentity, MissionContext,
    OutputPreferences, ProductDetails, StrategicNorthStar,
};

/// 周期任务模板
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const RECURRING_TEMPLATES: [RecurringTemplate; 4] = [
    RecurringTemplate {
        id: "competitor-pulse",
        name: "Competitor Pulse",
        description: "Daily sweep of launches, pricing moves and leadership changes",
    },
    RecurringTemplate {
        id: "pricing-watch",
        name: "Pricing Watch",
        description: "Track plan, packaging and discount changes before they hit your deals",
    },
    RecurringTemplate {
        id: "launch-radar",
        name: "Launch Radar",
        description: "Catch product releases and roadmap signals as they ship",
    },
    RecurringTemplate {
        id: "talent-tracker",
        name: "Talent Tracker",
        description: "Follow executive hires and team expansion as a leading indicator",
    },
];

pub fn find_template(id: &str) -> Option<&'static RecurringTemplate> {
    RECURRING_TEMPLATES.iter().find(|template| template.id == id)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// 为订阅者生成任务上下文，未知字段使用固定的订阅者默认值
pub fn build_mission_context(job: &RecurringJob, template: &RecurringTemplate) -> MissionContext {
    let custom_query: Vec<String> = job.custom_query.iter().cloned().collect();

    MissionContext {
        identity: FounderIdentity {
            full_name: String::from("Subscriber"),
            email: job.user_email.clone(),
            role: String::from("Founder"),
            linkedin_profile: None,
            twitter_handle: None,
        },
        company: CompanyProfile {
            name: String::from("Subscriber Company"),
            website_domain: String::from("https://example.com"),
            founding_year: 2024,
            headquarters_location: String::from("Remote"),
            employee_count_range: String::from("1-10"),
            primary_industry: String::from("Tech"),
            business_model: String::from("B2B SaaS"),
            current_funding_stage: String::from("Seed"),
            total_funding_raised: None,
        },
        strategy: StrategicNorthStar {
            core_value_proposition: template.name.to_string(),
            problem_being_solved: template.description.to_string(),
            ideal_customer_profile: String::from("Founders"),
            north_star_metric: String::from("Retention"),
            pricing_strategy: String::from("Freemium (Product Led)"),
            primary_gtm_motion: String::from("Product Led Growth (Self Serve)"),
            target_geography: strings(&["Global"]),
            positioning: String::from("Speed / Performance King"),
            unfair_advantage: String::from("Deep Tech / R&D"),
            key_partnerships: None,
        },
        product: ProductDetails {
            primary_feature_set: strings(&["Intelligence"]),
            technical_stack_core: None,
            compliance_requirements: Vec::new(),
            integrations_list: Vec::new(),
            deployment_method: String::from("Cloud"),
            mobile_app_available: false,
            api_first: true,
        },
        anxiety: AnxietyProfile {
            biggest_fear: String::from("Being blindsided"),
            what_keeps_you_up_at_night: String::from("Competitors"),
            known_weakness_internal: String::from("None"),
            top_reason_for_churn: String::from("Cost"),
            top_reason_for_loss_in_sales: String::from("Features"),
        },
        targets: CompetitorTargets {
            competitor_names: vec![job.target_name.clone()],
            specific_rumors_to_verify: custom_query.clone(),
            perceived_threat_level: String::from("Existential (Kill or be Killed)"),
            specific_questions_for_agent: custom_query,
            blacklisted_domains: Vec::new(),
        },
        output_preferences: OutputPreferences {
            report_tone: String::from("Ruthless VC (Critique)"),
            include_raw_sources: true,
            focus_areas: strings(&["Pricing", "Product", "Sentiment"]),
            language: String::from("English"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Frequency;
    use chrono::Utc;

    fn job(custom_query: Option<&str>) -> RecurringJob {
        RecurringJob {
            id: "job-1".into(),
            user_id: "user-1".into(),
            target_name: "Pinecone".into(),
            target_url: "https://pinecone.io".into(),
            template_id: "pricing-watch".into(),
            user_email: "ada@example.com".into(),
            custom_query: custom_query.map(str::to_string),
            frequency: Frequency::WeeklyMonday,
            next_run: Utc::now(),
        }
    }

    #[test]
    fn test_find_template() {
        assert_eq!(find_template("pricing-watch").map(|t| t.name), Some("Pricing Watch"));
        assert!(find_template("unknown").is_none());
    }

    #[test]
    fn test_context_uses_subscriber_defaults() {
        let template = find_template("pricing-watch").unwrap();
        let context = build_mission_context(&job(None), template);

        assert_eq!(context.identity.email, "ada@example.com");
        assert_eq!(context.identity.full_name, "Subscriber");
        assert_eq!(context.company.name, "Subscriber Company");
        assert_eq!(context.strategy.core_value_proposition, "Pricing Watch");
        assert_eq!(context.strategy.problem_being_solved, template.description);
        assert_eq!(context.targets.competitor_names, vec!["Pinecone"]);
        assert!(context.targets.specific_questions_for_agent.is_empty());
        assert_eq!(context.output_preferences.focus_areas, vec!["Pricing", "Product", "Sentiment"]);
        assert!(context.validate().is_ok());
    }

    #[test]
    fn test_custom_query_becomes_rumor_and_question() {
        let template = find_template("launch-radar").unwrap();
        let context = build_mission_context(&job(Some("Are they building an agent SDK?")), template);

        assert_eq!(
            context.targets.specific_rumors_to_verify,
            vec!["Are they building an agent SDK?"]
        );
        assert_eq!(
            context.targets.specific_questions_for_agent,
            vec!["Are they building an agent SDK?"]
        );
    }
}
