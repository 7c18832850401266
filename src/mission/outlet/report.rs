//! 报告编译 - 将关键Finding、建议与运行指标渲染为HTML简报

use chrono::{Datelike, NaiveDate};

use crate::mission::analysis::CriticalPath;
use crate::mission::context::ResearchState;
use crate::mission::research::RecencyWindow;
use crate::types::finding::{Evidence, Finding, Impact};
use crate::types::mission::MissionContext;
use crate::utils::text::{escape_html, truncate_chars};

/// 报告中展示的Finding上限
pub const MAX_REPORTED_FINDINGS: usize = 6;
/// 每条Finding展示的证据上限
pub const MAX_EVIDENCE_PER_FINDING: usize = 2;
/// 证据摘录的字符上限
pub const EVIDENCE_EXCERPT_CHARS: usize = 180;

const STYLE: &str = r#"
    body { font-family: 'Georgia', serif; color: #111; max-width: 720px; margin: 0 auto; padding: 40px 20px; line-height: 1.6; background: #fff; }
    .header { border-bottom: 2px solid #000; padding-bottom: 20px; margin-bottom: 40px; }
    .brand { font-family: 'Helvetica Neue', sans-serif; font-weight: 900; letter-spacing: 1px; font-size: 14px; color: #444; text-transform: uppercase; }
    .title { font-size: 32px; font-weight: 700; margin: 10px 0 5px 0; letter-spacing: -0.5px; }
    .meta { font-family: 'Helvetica Neue', sans-serif; font-size: 12px; color: #666; text-transform: uppercase; }
    h2 { font-family: 'Helvetica Neue', sans-serif; font-size: 16px; font-weight: 800; margin-top: 50px; text-transform: uppercase; letter-spacing: 0.5px; border-left: 4px solid #000; padding-left: 15px; color: #000; }
    .finding { margin-bottom: 35px; }
    .finding-headline { font-weight: 700; font-size: 19px; margin-bottom: 8px; line-height: 1.3; }
    .finding-meta { font-family: 'Helvetica Neue', sans-serif; font-size: 10px; color: #888; margin-bottom: 12px; font-weight: 700; letter-spacing: 0.5px; }
    .finding-tag { display: inline-block; background: #eee; padding: 2px 6px; border-radius: 3px; margin-right: 8px; }
    .tag-critical { background: #000; color: #fff; }
    .evidence-box { background: #f9f9f9; border-left: 1px solid #ccc; padding: 15px; margin-top: 12px; font-size: 13px; color: #555; font-family: 'Helvetica Neue', sans-serif; }
    .rec-item { background: #f4fbf7; border: 1px solid #dcfce7; padding: 20px; margin-bottom: 15px; border-radius: 4px; }
    .rec-title { font-family: 'Helvetica Neue', sans-serif; font-weight: 700; color: #166534; font-size: 14px; margin-bottom: 5px; text-transform: uppercase; }
    .pattern { font-family: 'Helvetica Neue', sans-serif; font-size: 13px; margin-bottom: 8px; }
    .footer { margin-top: 80px; border-top: 1px solid #eee; padding-top: 30px; font-family: 'Helvetica Neue', sans-serif; font-size: 11px; color: #aaa; text-align: center; }
"#;

/// 报告编译器
#[derive(Debug, Default)]
pub struct ReportCompiler;

impl ReportCompiler {
    /// 以 `today` 为报告日期渲染完整HTML文档
    pub fn compile(
        &self,
        context: &MissionContext,
        path: &CriticalPath,
        state: &ResearchState,
        today: NaiveDate,
    ) -> String {
        let competitors: Vec<&str> = context.competitors().collect();
        let window = RecencyWindow::at(today);

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <style>");
        html.push_str(STYLE);
        html.push_str("  </style>\n</head>\n<body>\n");

        html.push_str(&format!(
            "  <div class=\"header\">\n    <div class=\"brand\">Signl Intelligence</div>\n    <div class=\"title\">{}</div>\n    <div class=\"meta\">Strategic Dossier • {}/{}/{}</div>\n  </div>\n",
            escape_html(&competitors.join(" vs ")),
            today.month(),
            today.day(),
            today.year()
        ));

        html.push_str(&format!(
            "  <p style=\"font-size: 18px; line-height: 1.7;\">\n    <strong>Executive Summary:</strong> We tracked strategic shifts in {} over the last {} minutes of deep autonomous research.\n    Intelligence was gathered from {} sources.\n  </p>\n",
            escape_html(context.primary_competitor()),
            state.elapsed_minutes(),
            state.metrics.total_tool_calls
        ));

        html.push_str("  <h2>Strategic Counter-Measures</h2>\n  <div>\n");
        for (i, recommendation) in path.recommendations.iter().enumerate() {
            html.push_str(&format!(
                "    <div class=\"rec-item\">\n      <div class=\"rec-title\">Action {}</div>\n      {}\n    </div>\n",
                i + 1,
                escape_html(recommendation)
            ));
        }
        html.push_str("  </div>\n");

        html.push_str(&format!(
            "  <h2>Critical Intelligence ({})</h2>\n",
            window.range_label()
        ));
        for finding in path.critical_findings.iter().take(MAX_REPORTED_FINDINGS) {
            render_finding(&mut html, finding);
        }

        if !path.patterns.is_empty() {
            html.push_str("  <h2>Strategic Patterns</h2>\n");
            for pattern in &path.patterns {
                html.push_str(&format!(
                    "  <div class=\"pattern\">{} ({}% confidence)</div>\n",
                    escape_html(&pattern.description),
                    pattern.confidence
                ));
            }
        }

        if !path.strategic_answers.is_empty() {
            html.push_str("  <h2>Your Questions</h2>\n");
            for answer in &path.strategic_answers {
                html.push_str(&format!(
                    "  <div class=\"finding\">\n    <div class=\"finding-headline\">{}</div>\n    <div class=\"evidence-box\">{}</div>\n  </div>\n",
                    escape_html(&answer.question),
                    escape_html(&truncate_chars(&answer.answer, 600))
                ));
            }
        }

        html.push_str(
            "  <div class=\"footer\">CONFIDENTIAL BRIEFING • GENERATED BY SIGNL V5.0</div>\n</body>\n</html>\n",
        );
        html
    }
}

fn render_finding(html: &mut String, finding: &Finding) {
    let tag_class = if finding.impact == Impact::Critical {
        "finding-tag tag-critical"
    } else {
        "finding-tag"
    };
    html.push_str(&format!(
        "  <div class=\"finding\">\n    <div class=\"finding-headline\">{}</div>\n    <div class=\"finding-meta\">\n      <span class=\"{}\">{}</span>\n      {}\n    </div>\n    <div class=\"evidence-box\">\n",
        escape_html(&finding.signal),
        tag_class,
        finding.impact,
        finding.category
    ));
    for evidence in finding.evidence.iter().take(MAX_EVIDENCE_PER_FINDING) {
        html.push_str(&format!(
            "      <div style=\"margin-bottom: 8px;\">\n        <strong>{}:</strong> {}...\n      </div>\n",
            escape_html(&source_label(evidence)),
            escape_html(&truncate_chars(&evidence.snippet, EVIDENCE_EXCERPT_CHARS))
        ));
    }
    html.push_str("    </div>\n  </div>\n");
}

/// 来源标签：大写，并去掉连字符后的后缀
fn source_label(evidence: &Evidence) -> String {
    let upper = evidence.source.to_uppercase();
    upper.split('-').next().unwrap_or_default().to_string()
}
