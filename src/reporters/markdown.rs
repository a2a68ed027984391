//! Markdown reporter for audit reports
//!
//! Generates GitHub-flavored Markdown suitable for pull request comments
//! or a checked-in audit log.

use crate::models::{AuditReport, CriterionResult};
use anyhow::Result;
use chrono::Local;

/// Render report as GitHub-flavored Markdown
pub fn render(report: &AuditReport) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');

    md.push_str(&render_score_table(report));
    md.push('\n');

    md.push_str("## Criteria\n\n");
    for criterion in &report.criteria {
        md.push_str(&render_criterion(criterion));
        md.push('\n');
    }

    md.push_str(&render_list("Key Risks", &report.key_risks, "No key risks identified."));
    md.push('\n');
    md.push_str(&render_list("Next Steps", &report.next_steps, "Nothing to follow up."));
    md.push('\n');

    md.push_str(&render_footer());

    Ok(md)
}

fn render_header(report: &AuditReport) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

    format!(
        r#"# Audit Report

**Overall Score: {}/5**

{}

Generated: {}
"#,
        report.overall_score,
        escape_md(&report.executive_summary),
        timestamp
    )
}

fn render_score_table(report: &AuditReport) -> String {
    let mut md = String::from("## Scores\n\n| Criterion | Score | Dissent |\n|-----------|-------|---------|\n");
    for criterion in &report.criteria {
        md.push_str(&format!(
            "| `{}` | {}/5 | {} |\n",
            criterion.criterion_id,
            criterion.final_score,
            if criterion.dissent.is_some() { "yes" } else { "" }
        ));
    }
    md
}

fn render_criterion(criterion: &CriterionResult) -> String {
    let mut md = format!(
        "### {} ({}/5)\n\n{}\n",
        criterion.criterion_id,
        criterion.final_score,
        escape_md(&criterion.summary)
    );

    for (title, items) in [
        ("Strengths", &criterion.strengths),
        ("Weaknesses", &criterion.weaknesses),
        ("Remediation", &criterion.remediation),
    ] {
        if items.is_empty() {
            continue;
        }
        md.push_str(&format!("\n**{}**\n\n", title));
        for item in items {
            md.push_str(&format!("- {}\n", escape_md(item)));
        }
    }

    if let Some(dissent) = &criterion.dissent {
        md.push_str(&format!("\n> **Dissent:** {}\n", escape_md(dissent)));
    }
    md
}

fn render_list(title: &str, items: &[String], empty: &str) -> String {
    let mut md = format!("## {}\n\n", title);
    if items.is_empty() {
        md.push_str(empty);
        md.push('\n');
    }
    for item in items {
        md.push_str(&format!("- {}\n", escape_md(item)));
    }
    md
}

fn render_footer() -> String {
    format!(
        "---\n\n*Generated by tribunal {}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Escape characters that would break list and table rendering
fn escape_md(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
