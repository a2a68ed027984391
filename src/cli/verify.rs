//! `tribunal verify`

use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use tribunal::config::ProjectConfig;
use tribunal::forensics::verify_with;
use tribunal::reporters::{render_verification, OutputFormat};

pub fn run(
    path: &Path,
    config: &ProjectConfig,
    format: &str,
    output: Option<&Path>,
    fail_unverified: bool,
) -> Result<()> {
    let repo_path = path
        .canonicalize()
        .with_context(|| format!("Path not found: {}", path.display()))?;
    let format = OutputFormat::from_str(format)?;

    let result = verify_with(&repo_path, &config.verifier);
    info!("Verification of {}: {}", repo_path.display(), result.reason);

    let rendered = render_verification(&result, format)?;
    super::emit(&rendered, output)?;

    if fail_unverified && !result.verified {
        eprintln!("Failing due to --fail-unverified: {}", result.reason);
        std::process::exit(1);
    }
    Ok(())
}
