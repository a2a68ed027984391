//! Tribunal - rubric-driven repository audits
//!
//! Two cooperating engines:
//! - [`forensics`] statically verifies a repository's workflow graph and
//!   state shape with tree-sitter, scans it for unsafe shell execution and
//!   reads its git history.
//! - [`synthesis`] reduces judge [`models::Opinion`]s per rubric criterion
//!   into an [`models::AuditReport`], with security and fact-supremacy
//!   overrides.
//!
//! [`judges`] produces the opinions in between, either deterministically or
//! through an external command.

pub mod config;
pub mod detectors;
pub mod forensics;
pub mod git;
pub mod judges;
pub mod models;
pub mod parsers;
pub mod reporters;
pub mod rubric;
pub mod synthesis;
