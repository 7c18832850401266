//! 关键词分类 - 对上游自由文本做近似归类，误判属于已接受的精度风险

use crate::types::finding::{FindingCategory, Impact};

/// 根据研究焦点归类
pub fn categorize(focus: &str) -> FindingCategory {
    let focus = focus.to_lowercase();
    if focus.contains("pric") {
        FindingCategory::Pricing
    } else if focus.contains("product") {
        FindingCategory::Product
    } else if focus.contains("hire") {
        FindingCategory::People
    } else if focus.contains("sentiment") {
        FindingCategory::Sentiment
    } else {
        FindingCategory::Strategy
    }
}

/// 根据分析文本评估影响等级
pub fn assess_impact(analysis: &str) -> Impact {
    let analysis = analysis.to_lowercase();
    if analysis.contains("critical") {
        Impact::Critical
    } else if analysis.contains("important") {
        Impact::High
    } else {
        Impact::Medium
    }
}
