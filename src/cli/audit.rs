//! `tribunal audit`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use tribunal::config::ProjectConfig;
use tribunal::forensics::{to_evidence_map, verify_with};
use tribunal::judges::{collect_opinions, provider_from_settings};
use tribunal::models::{append_opinions, merge_evidence, EvidenceMap, Opinion};
use tribunal::reporters::{render_audit, OutputFormat};
use tribunal::rubric::load_rubric;
use tribunal::synthesis::synthesize;

pub struct AuditArgs {
    pub rubric: PathBuf,
    pub evidence: Vec<PathBuf>,
    pub opinions: Vec<PathBuf>,
    pub judge_command: Vec<String>,
    pub format: Option<String>,
    pub output: Option<PathBuf>,
}

pub fn run(path: &Path, mut config: ProjectConfig, args: AuditArgs) -> Result<()> {
    let repo_path = path
        .canonicalize()
        .with_context(|| format!("Path not found: {}", path.display()))?;

    let format_name = args
        .format
        .or_else(|| config.defaults.format.clone())
        .unwrap_or_else(|| "json".to_string());
    let format = OutputFormat::from_str(&format_name)?;
    let output = args
        .output
        .or_else(|| config.defaults.output.as_ref().map(PathBuf::from));

    let rubric = load_rubric(&args.rubric)?;
    info!(
        "Loaded rubric with {} criteria from {}",
        rubric.criteria().len(),
        args.rubric.display()
    );

    let forensics = verify_with(&repo_path, &config.verifier);
    info!("Verification: {}", forensics.reason);

    let mut evidence = to_evidence_map(&forensics);
    for file in &args.evidence {
        evidence = merge_evidence(evidence, read_evidence(file)?);
    }
    debug!("Evidence sources: {:?}", evidence.keys().collect::<Vec<_>>());

    let opinions = if args.opinions.is_empty() {
        if !args.judge_command.is_empty() {
            config.judges.command = args.judge_command;
        }
        let provider = provider_from_settings(&config.judges);
        collect_opinions(provider.as_ref(), &rubric, &evidence, &config.judges)
    } else {
        let mut opinions = Vec::new();
        for file in &args.opinions {
            opinions = append_opinions(opinions, read_opinions(file)?);
        }
        info!("Loaded {} pre-produced opinions", opinions.len());
        opinions
    };

    let report = synthesize(&evidence, &opinions, &rubric);
    let rendered = render_audit(&report, format)?;
    super::emit(&rendered, output.as_deref())
}

fn read_evidence(path: &Path) -> Result<EvidenceMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read evidence file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid evidence JSON in {}", path.display()))
}

fn read_opinions(path: &Path) -> Result<Vec<Opinion>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read opinions file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid opinions JSON in {}", path.display()))
}
