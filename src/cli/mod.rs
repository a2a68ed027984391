//! CLI command definitions and handlers

mod audit;
mod verify;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tribunal::config::{load_config_file, load_project_config, ProjectConfig};

/// Tribunal - rubric-driven repository audits
#[derive(Parser, Debug)]
#[command(name = "tribunal")]
#[command(
    version,
    about = "Rubric-driven repository audit: structural forensics plus multi-judge synthesis",
    after_help = "\
Examples:
  tribunal verify .                                  Check graph/state structure and unsafe calls
  tribunal verify ./agent --format json              JSON verification result
  tribunal audit . --rubric rubric.json              Audit with deterministic judges
  tribunal audit . --rubric rubric.json --judge-command my-judge --model fast
  tribunal audit . --rubric rubric.json --opinions opinions.json --format markdown -o AUDIT.md"
)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: tribunal.toml or .tribunalrc.json in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Statically verify a repository's workflow graph, state shape and shell usage
    Verify {
        /// Path to repository
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format: text or json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Exit with code 1 when the structure is not verified
        #[arg(long)]
        fail_unverified: bool,
    },

    /// Verify a repository, collect judge opinions and synthesize an audit report
    Audit {
        /// Path to repository
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Rubric file (JSON)
        #[arg(long, short = 'r')]
        rubric: PathBuf,

        /// Extra evidence to merge, as JSON keyed by source id (repeatable)
        #[arg(long)]
        evidence: Vec<PathBuf>,

        /// Pre-produced opinions, as a JSON array (repeatable); replaces the judges
        #[arg(long)]
        opinions: Vec<PathBuf>,

        /// External judge program and its arguments (overrides [judges].command)
        #[arg(long, num_args = 1.., allow_hyphen_values = true)]
        judge_command: Vec<String>,

        /// Output format: json or markdown (default: [defaults].format, then json)
        #[arg(long, short = 'f', value_parser = ["json", "markdown", "md"])]
        format: Option<String>,

        /// Output file path (default: [defaults].output, then stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

/// Run the parsed command
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Verify {
            path,
            format,
            output,
            fail_unverified,
        } => verify::run(&path, &config, &format, output.as_deref(), fail_unverified),

        Commands::Audit {
            path,
            rubric,
            evidence,
            opinions,
            judge_command,
            format,
            output,
        } => audit::run(
            &path,
            config,
            audit::AuditArgs {
                rubric,
                evidence,
                opinions,
                judge_command,
                format,
                output,
            },
        ),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<ProjectConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Ok(load_config_file(path))
        }
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            Ok(load_project_config(&cwd))
        }
    }
}

/// Write rendered output to a file, or stdout when no file is given
fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(out_path) => {
            std::fs::write(out_path, content)
                .with_context(|| format!("Failed to write {}", out_path.display()))?;
            eprintln!("Report written to: {}", out_path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
