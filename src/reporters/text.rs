//! Text (terminal) reporter for verification results

use crate::forensics::ForensicsResult;
use anyhow::Result;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";

fn mark(ok: bool) -> String {
    if ok {
        format!("{GREEN}ok{RESET}")
    } else {
        format!("{RED}missing{RESET}")
    }
}

/// Render a verification result as terminal output
pub fn render(result: &ForensicsResult) -> Result<String> {
    let mut out = String::new();

    let status = if result.verified {
        format!("{GREEN}{BOLD}VERIFIED{RESET}")
    } else {
        format!("{RED}{BOLD}NOT VERIFIED{RESET}")
    };
    out.push_str(&format!("\n{BOLD}Structural Forensics{RESET}  {status}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!("{}\n", result.reason));
    out.push_str(&format!("{DIM}Audited: {}{RESET}\n\n", result.file_audited));

    out.push_str(&format!("{BOLD}GRAPH{RESET}\n"));
    out.push_str(&format!(
        "  Fan-out from START: {} ({} edge(s){})\n",
        mark(result.parallel),
        result.start_fanout_count,
        if result.start_targets.is_empty() {
            String::new()
        } else {
            format!(": {}", result.start_targets.join(", "))
        }
    ));
    out.push_str(&format!(
        "  Aggregator fan-in:  {}\n",
        mark(result.fan_in_nodes_present)
    ));
    out.push_str(&format!(
        "  Judge fan-out:      {} ({} edge(s))\n",
        mark(result.judge_fanout_present),
        result.judge_edges.len()
    ));
    out.push_str(&format!(
        "  Conditional edges:  {}\n",
        mark(result.conditional_edges_present)
    ));
    out.push_str(&format!(
        "  Edge to END:        {}\n\n",
        mark(result.terminal_edge_present)
    ));

    out.push_str(&format!("{BOLD}STATE{RESET}\n"));
    out.push_str(&format!(
        "  Typed state:        {}{}\n",
        mark(result.typed_state_present),
        if result.state_types.is_empty() {
            String::new()
        } else {
            format!(" ({})", result.state_types.join(", "))
        }
    ));
    out.push_str(&format!(
        "  Union reducer:      {}\n",
        mark(result.reducer_union)
    ));
    out.push_str(&format!(
        "  Append reducer:     {}\n\n",
        mark(result.reducer_append)
    ));

    out.push_str(&format!("{BOLD}SECURITY{RESET}\n"));
    if !result.scan_completed {
        out.push_str(&format!("  {DIM}Repository scan not run{RESET}\n"));
    } else if result.unsafe_calls.is_empty() {
        out.push_str(&format!("  {GREEN}No unsafe execution found{RESET}\n"));
    } else {
        for call in &result.unsafe_calls {
            out.push_str(&format!(
                "  {RED}{}:{}{RESET} {}\n",
                call.path, call.line, call.callee
            ));
        }
    }
    if !result.skipped_files.is_empty() {
        out.push_str(&format!(
            "  {DIM}{} file(s) skipped{RESET}\n",
            result.skipped_files.len()
        ));
        for skipped in &result.skipped_files {
            out.push_str(&format!("    {DIM}{}: {}{RESET}\n", skipped.path, skipped.reason));
        }
    }
    out.push('\n');

    out.push_str(&format!("{BOLD}HISTORY{RESET}\n"));
    match (result.history.first(), result.history.last()) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("  {} commit(s)\n", result.history.len()));
            out.push_str(&format!(
                "  First: {} {} {}\n",
                first.id, first.timestamp, first.message
            ));
            if result.history.len() > 1 {
                out.push_str(&format!(
                    "  Last:  {} {} {}\n",
                    last.id, last.timestamp, last.message
                ));
            }
        }
        _ => {
            let note = result.history_note.as_deref().unwrap_or("No commits");
            out.push_str(&format!("  {DIM}{}{RESET}\n", note));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::UnsafeCallKind;
    use crate::forensics::UnsafeFinding;

    #[test]
    fn test_render_unverified_with_findings() {
        let result = ForensicsResult {
            reason: "Graph/state structure incomplete: missing typed state".into(),
            file_audited: "src/graph.py".into(),
            parallel: true,
            start_fanout_count: 2,
            start_targets: vec!["repo".into(), "doc".into()],
            scan_completed: true,
            unsafe_files: vec!["tools/run.py".into()],
            unsafe_calls: vec![UnsafeFinding {
                path: "tools/run.py".into(),
                kind: UnsafeCallKind::DirectShell,
                callee: "os.system".into(),
                line: 4,
            }],
            history_note: Some("No git history available: not a repository".into()),
            ..Default::default()
        };

        let out = render(&result).expect("render text");
        assert!(out.contains("NOT VERIFIED"));
        assert!(out.contains("2 edge(s): repo, doc"));
        assert!(out.contains("tools/run.py:4"));
        assert!(out.contains("No git history available"));
    }

    #[test]
    fn test_render_scan_not_run() {
        let out = render(&ForensicsResult::default()).expect("render text");
        assert!(out.contains("Repository scan not run"));
        assert!(out.contains("No commits"));
    }
}
