//! Git history extraction
//!
//! The verifier reads commit history only as supporting evidence, so every
//! failure here is soft: callers log it and carry on without history.
//!
//! # Example
//!
//! ```no_run
//! use tribunal::git::GitHistory;
//! use std::path::Path;
//!
//! let history = GitHistory::open(Path::new("/path/to/repo")).unwrap();
//! for commit in history.chronological(50).unwrap() {
//!     println!("{} {} {}", commit.timestamp, commit.author, commit.message);
//! }
//! ```

pub mod history;

pub use history::{CommitSummary, GitHistory};
