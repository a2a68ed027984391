//! Project-level configuration support
//!
//! Loads configuration from `tribunal.toml` or `.tribunalrc.json` in the
//! working directory, or from an explicit file.
//!
//! # Configuration Format
//!
//! ```toml
//! # tribunal.toml
//!
//! [verifier]
//! workflow_file = "src/graph.py"
//! state_file = "src/state.py"
//! extensions = ["py", "pyi"]
//! exclude_dirs = [".git", ".venv", "node_modules"]
//! exclude_paths = ["src/tools/repo_tools.py"]
//! max_history = 50
//!
//! [judges]
//! command = ["my-judge", "--model", "small"]  # omit for deterministic judges
//! timeout_secs = 120
//! retries = 1
//! max_evidence = 6
//! citation_limit = 3
//!
//! [defaults]
//! format = "markdown"
//! output = "audit.md"
//! ```

use crate::parsers::{ScanOptions, DEFAULT_EXCLUDE_DIRS, DEFAULT_EXTENSIONS};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

pub const TOML_CONFIG_FILE: &str = "tribunal.toml";
pub const JSON_CONFIG_FILE: &str = ".tribunalrc.json";

/// The audited project's own forensic tool, which spells out the unsafe
/// patterns it looks for.
pub const DEFAULT_SELF_EXCLUSION: &str = "src/tools/repo_tools.py";

/// Complete configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub verifier: VerifierConfig,
    pub judges: JudgeSettings,
    pub defaults: CliDefaults,
}

/// Where the verifier looks and what it skips
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Workflow definition file, relative to the repository root
    pub workflow_file: String,
    /// State definition file, relative to the repository root
    pub state_file: String,
    pub extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
    /// Files never scanned for unsafe calls
    pub exclude_paths: Vec<String>,
    /// Commits kept in the history summary
    pub max_history: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            workflow_file: "src/graph.py".to_string(),
            state_file: "src/state.py".to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            exclude_paths: vec![DEFAULT_SELF_EXCLUSION.to_string()],
            max_history: 50,
        }
    }
}

impl VerifierConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            extensions: self.extensions.clone(),
            exclude_dirs: self.exclude_dirs.clone(),
            exclude_paths: self.exclude_paths.clone(),
        }
    }
}

/// How judge opinions are produced
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JudgeSettings {
    /// External judge program and arguments; empty means deterministic judges
    pub command: Vec<String>,
    pub timeout_secs: u64,
    /// Extra attempts after a failed external call
    pub retries: u32,
    /// Evidence lines shown to a judge
    pub max_evidence: usize,
    /// Default citations attached when a judge cites nothing
    pub citation_limit: usize,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: 120,
            retries: 0,
            max_evidence: 6,
            citation_limit: 3,
        }
    }
}

/// CLI defaults (overridden by command-line flags)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliDefaults {
    pub format: Option<String>,
    pub output: Option<String>,
}

/// Load configuration from a directory.
///
/// Searches for configuration files in this order:
/// 1. `tribunal.toml`
/// 2. `.tribunalrc.json`
///
/// Returns default configuration if no config file is found or none loads.
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    let toml_path = dir.join(TOML_CONFIG_FILE);
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = dir.join(JSON_CONFIG_FILE);
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

/// Load an explicitly named config file, picking the format by extension.
pub fn load_config_file(path: &Path) -> ProjectConfig {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let loaded = if is_json {
        load_json_config(path)
    } else {
        load_toml_config(path)
    };
    match loaded {
        Ok(config) => {
            debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            ProjectConfig::default()
        }
    }
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

fn load_json_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    Ok(config)
}
