//! Configuration module
//!
//! This module handles:
//! - Project-level configuration (tribunal.toml / .tribunalrc.json)
//! - Verifier conventions (entry files, scanned extensions, exclusions)
//! - Judge settings
//! - CLI defaults

mod project_config;

pub use project_config::{
    load_config_file, load_project_config, CliDefaults, JudgeSettings, ProjectConfig,
    VerifierConfig, DEFAULT_SELF_EXCLUSION, JSON_CONFIG_FILE, TOML_CONFIG_FILE,
};
