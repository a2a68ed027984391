//! Structural forensics
//!
//! [`verify`] checks a repository snapshot for the expected workflow wiring
//! (parallel fan-out from the start sentinel, aggregator fan-in, judge
//! fan-out, conditional routing, a terminal edge) and a typed state with
//! merge reducers. It also scans every source file for unsafe process
//! execution and summarizes commit history.
//!
//! Nothing in here returns an error. Every failure mode (missing entry
//! file, unparsable file, no git history) is folded into the returned
//! [`ForensicsResult`].

mod evidence;

pub use evidence::{to_evidence, to_evidence_map, REPO_SOURCE};

use crate::config::VerifierConfig;
use crate::detectors::{DetectorOutcome, PatternDetector, UnsafeCallKind};
use crate::git::{CommitSummary, GitHistory};
use crate::parsers::{self, ParsedSource, ScanEntry, SkippedFile, SourceScanner};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// One unsafe call site, with the file it lives in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsafeFinding {
    pub path: String,
    pub kind: UnsafeCallKind,
    pub callee: String,
    pub line: u32,
}

/// Everything the verifier learned about one repository snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ForensicsResult {
    /// All structural predicates hold
    pub verified: bool,
    pub start_fanout_count: usize,
    pub start_targets: Vec<String>,
    /// Two or more edges leave the start sentinel
    pub parallel: bool,
    /// Both aggregator nodes are registered
    pub fan_in_nodes_present: bool,
    pub judge_fanout_present: bool,
    pub judge_edges: Vec<(String, String)>,
    pub conditional_edges_present: bool,
    pub terminal_edge_present: bool,
    pub typed_state_present: bool,
    pub state_types: Vec<String>,
    pub reducer_union: bool,
    pub reducer_append: bool,
    /// Files containing unsafe execution calls, in scan order
    pub unsafe_files: Vec<String>,
    pub unsafe_calls: Vec<UnsafeFinding>,
    /// The whole-repository scan ran (false when an entry file is missing)
    pub scan_completed: bool,
    pub skipped_files: Vec<SkippedFile>,
    /// Commits, oldest first
    pub history: Vec<CommitSummary>,
    /// Why history is empty, when it is
    pub history_note: Option<String>,
    pub reason: String,
    pub file_audited: String,
}

impl ForensicsResult {
    fn missing(file: &str) -> Self {
        Self {
            reason: format!("Missing {}", file),
            file_audited: file.to_string(),
            ..Default::default()
        }
    }

    /// Names of the structural predicates that did not hold.
    pub fn failed_checks(&self) -> Vec<&'static str> {
        let checks = [
            ("parallel fan-out from START", self.parallel),
            ("aggregator fan-in nodes", self.fan_in_nodes_present),
            ("judge fan-out", self.judge_fanout_present),
            ("conditional edges", self.conditional_edges_present),
            ("terminal edge to END", self.terminal_edge_present),
            ("typed state", self.typed_state_present),
            ("state reducers", self.reducer_union || self.reducer_append),
        ];
        checks
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }

    fn apply(&mut self, outcome: DetectorOutcome) {
        match outcome {
            DetectorOutcome::StartFanout {
                count,
                targets,
                parallel,
            } => {
                self.start_fanout_count = count;
                self.start_targets = targets;
                self.parallel = parallel;
            }
            DetectorOutcome::TypedState {
                present,
                state_types,
            } => {
                self.typed_state_present = present;
                self.state_types = state_types;
            }
            DetectorOutcome::Reducers { union, append } => {
                self.reducer_union = union;
                self.reducer_append = append;
            }
            DetectorOutcome::FanIn {
                first,
                second,
                judge_edges,
                judge_fanout,
            } => {
                self.fan_in_nodes_present = first && second;
                self.judge_edges = judge_edges;
                self.judge_fanout_present = judge_fanout;
            }
            DetectorOutcome::Edges {
                conditional,
                terminal,
            } => {
                self.conditional_edges_present = conditional;
                self.terminal_edge_present = terminal;
            }
            // Unsafe calls come from the whole-repository scan
            DetectorOutcome::UnsafeCalls(_) => {}
        }
    }
}

/// Verify a repository with default conventions.
pub fn verify(repo_path: &Path) -> ForensicsResult {
    verify_with(repo_path, &VerifierConfig::default())
}

pub fn verify_with(repo_path: &Path, config: &VerifierConfig) -> ForensicsResult {
    info!("Verifying {}", repo_path.display());

    for entry_file in [&config.workflow_file, &config.state_file] {
        if !repo_path.join(entry_file).is_file() {
            warn!("Entry file missing: {}", entry_file);
            return ForensicsResult::missing(entry_file);
        }
    }

    let mut result = ForensicsResult {
        file_audited: format!("{} + {}", config.workflow_file, config.state_file),
        ..Default::default()
    };

    let workflow = load_entry(repo_path, &config.workflow_file);
    let state = load_entry(repo_path, &config.state_file);

    let mut parse_errors = Vec::new();
    let runs: [(&Result<ParsedSource, SkippedFile>, &[PatternDetector]); 2] = [
        (&workflow, &PatternDetector::WORKFLOW),
        (&state, &PatternDetector::STATE),
    ];
    for (entry, detectors) in runs {
        match entry {
            Ok(parsed) => {
                for detector in detectors {
                    let outcome = detector.run(parsed);
                    debug!("{} on {}: {:?}", detector, parsed.path, outcome);
                    result.apply(outcome);
                }
            }
            Err(skipped) => parse_errors.push(format!("{}: {}", skipped.path, skipped.reason)),
        }
    }

    let failed = result.failed_checks();
    result.verified = parse_errors.is_empty() && failed.is_empty();
    result.reason = if result.verified {
        "Verified: parallel fan-out/fan-in graph with typed state reducers".to_string()
    } else if !parse_errors.is_empty() {
        format!("Parsing error in {}", parse_errors.join("; "))
    } else {
        format!("Graph/state structure incomplete: missing {}", failed.join(", "))
    };

    scan_unsafe_calls(repo_path, config, &mut result);
    load_history(repo_path, config.max_history, &mut result);

    info!(
        "Verification of {} finished: verified={}, unsafe_files={}",
        repo_path.display(),
        result.verified,
        result.unsafe_files.len()
    );
    result
}

fn load_entry(repo_path: &Path, relative: &str) -> Result<ParsedSource, SkippedFile> {
    match parsers::load(&repo_path.join(relative), relative.to_string()) {
        ScanEntry::Parsed(parsed) => Ok(parsed),
        ScanEntry::Skipped(skipped) => Err(skipped),
    }
}

/// Parse every candidate file in parallel and collect unsafe calls in
/// scan order.
fn scan_unsafe_calls(repo_path: &Path, config: &VerifierConfig, result: &mut ForensicsResult) {
    let scanner = SourceScanner::new(repo_path, config.scan_options());
    let candidates = scanner.candidate_paths();
    debug!("Scanning {} files for unsafe calls", candidates.len());

    let entries: Vec<ScanEntry> = candidates
        .par_iter()
        .map(|(path, relative)| parsers::load(path, relative.clone()))
        .collect();

    for entry in entries {
        match entry {
            ScanEntry::Parsed(parsed) => {
                let DetectorOutcome::UnsafeCalls(calls) = PatternDetector::UnsafeCalls.run(&parsed)
                else {
                    continue;
                };
                if calls.is_empty() {
                    continue;
                }
                result.unsafe_files.push(parsed.path.clone());
                result
                    .unsafe_calls
                    .extend(calls.into_iter().map(|call| UnsafeFinding {
                        path: parsed.path.clone(),
                        kind: call.kind,
                        callee: call.callee,
                        line: call.line,
                    }));
            }
            ScanEntry::Skipped(skipped) => result.skipped_files.push(skipped),
        }
    }
    result.scan_completed = true;
}

fn load_history(repo_path: &Path, max_history: usize, result: &mut ForensicsResult) {
    match GitHistory::open(repo_path).and_then(|history| history.chronological(max_history)) {
        Ok(commits) => result.history = commits,
        Err(e) => {
            debug!("No git history for {}: {:#}", repo_path.display(), e);
            result.history_note = Some(format!("No git history available: {:#}", e));
        }
    }
}
