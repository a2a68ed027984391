//! Output reporters for verification results and audit reports
//!
//! Supports multiple output formats:
//! - `text` - Terminal summary of a verification run
//! - `json` - Machine-readable JSON for either result
//! - `markdown` - GitHub-flavored Markdown audit report

mod json;
mod markdown;
mod text;

use crate::forensics::ForensicsResult;
use crate::models::AuditReport;
use anyhow::{anyhow, bail, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Render a verification result (`text` or `json`)
pub fn render_verification(result: &ForensicsResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(result),
        OutputFormat::Json => json::render(result),
        OutputFormat::Markdown => bail!("Verification results support text and json output only"),
    }
}

/// Render an audit report (`json` or `markdown`)
pub fn render_audit(report: &AuditReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report),
        OutputFormat::Text => bail!("Audit reports support json and markdown output only"),
    }
}
