//! Turn a [`ForensicsResult`] into evidence records judges can cite.

use super::ForensicsResult;
use crate::models::{
    Evidence, EvidenceMap, ARCHITECTURE_GOAL, HISTORY_GOAL, SECURITY_SCAN_GOAL,
    UNSAFE_EXECUTION_GOAL,
};

/// Source id the verifier's evidence is filed under
pub const REPO_SOURCE: &str = "repo_detective";

/// Collapse whitespace and cut to `max_chars`, marking the cut with "...".
fn clip(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut clipped: String = collapsed.chars().take(max_chars).collect();
    clipped.push_str("...");
    clipped
}

/// Evidence in citation order: architecture, then security and history when
/// the repository scan ran.
pub fn to_evidence(result: &ForensicsResult) -> Vec<Evidence> {
    let mut evidence = vec![architecture_evidence(result)];
    if result.scan_completed {
        evidence.push(security_evidence(result));
        evidence.push(history_evidence(result));
    }
    evidence
}

/// [`to_evidence`] filed under [`REPO_SOURCE`].
pub fn to_evidence_map(result: &ForensicsResult) -> EvidenceMap {
    EvidenceMap::from([(REPO_SOURCE.to_string(), to_evidence(result))])
}

fn architecture_evidence(result: &ForensicsResult) -> Evidence {
    let mut lines = vec![
        format!("verified={}", result.verified),
        format!("parallel={}", result.parallel),
        format!("fan_in={}", result.fan_in_nodes_present),
        format!("conditional={}", result.conditional_edges_present),
        format!("terminal={}", result.terminal_edge_present),
        format!("typed_state={}", result.typed_state_present),
    ];
    if !result.start_targets.is_empty() {
        lines.push(format!("START fan-out -> {}", result.start_targets.join(", ")));
    }
    if !result.judge_edges.is_empty() {
        let judges: Vec<&str> = result.judge_edges.iter().map(|(_, to)| to.as_str()).collect();
        lines.push(format!("Judges fan-out -> {}", judges.join(", ")));
    }
    let mut reducers = Vec::new();
    if result.reducer_union {
        reducers.push("operator.ior");
    }
    if result.reducer_append {
        reducers.push("operator.add");
    }
    if !reducers.is_empty() {
        lines.push(format!("Reducers -> {}", reducers.join(", ")));
    }

    Evidence::new(
        ARCHITECTURE_GOAL,
        result.verified,
        result.file_audited.as_str(),
        clip(&format!("AST verification summary: {}", result.reason), 260),
        if result.verified { 1.0 } else { 0.65 },
    )
    .with_content(clip(&lines.join(" | "), 320))
}

fn security_evidence(result: &ForensicsResult) -> Evidence {
    if result.unsafe_files.is_empty() {
        return Evidence::new(
            SECURITY_SCAN_GOAL,
            false,
            "Repository Scan",
            "Static scan did not detect unsafe execution patterns in Python files.",
            0.9,
        )
        .with_content("No unsafe execution patterns found (os.system / shell=True).");
    }

    let examples: Vec<&str> = result.unsafe_files.iter().take(3).map(String::as_str).collect();
    Evidence::new(
        UNSAFE_EXECUTION_GOAL,
        true,
        examples.join(", "),
        format!(
            "Detected unsafe call patterns in {} file(s). Replace os.system/subprocess(shell=True) with safe APIs.",
            result.unsafe_files.len()
        ),
        0.9,
    )
    .with_content(clip(&format!("Examples: {}", examples.join(", ")), 240))
}

fn history_evidence(result: &ForensicsResult) -> Evidence {
    let (Some(first), Some(last)) = (result.history.first(), result.history.last()) else {
        let note = result
            .history_note
            .as_deref()
            .unwrap_or("No commits found.");
        return Evidence::new(HISTORY_GOAL, false, "git log", clip(note, 260), 0.5);
    };

    let count = result.history.len();
    let rationale = if count == 1 {
        "Single commit history: looks like a bulk upload rather than iterative development."
            .to_string()
    } else {
        format!("{} commits from {} to {}.", count, first.timestamp, last.timestamp)
    };
    let content = format!(
        "first: {} {} ({}) | last: {} {} ({})",
        first.id, first.message, first.author, last.id, last.message, last.author
    );

    Evidence::new(
        HISTORY_GOAL,
        true,
        "git log",
        rationale,
        if count == 1 { 0.6 } else { 0.8 },
    )
    .with_content(clip(&content, 240))
}
