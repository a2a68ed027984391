//! CLI contract tests against the built binary

mod common;

use common::{compliant_git_repo, compliant_repo, write, RUBRIC, UNSAFE_TOOL};
use std::path::Path;
use std::process::{Command, Output};

fn tribunal(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tribunal"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run tribunal")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout is JSON")
}

#[test]
fn test_verify_json() {
    let dir = compliant_git_repo();
    let output = tribunal(dir.path(), &["verify", ".", "--format", "json"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["verified"], true);
    assert_eq!(json["history"].as_array().unwrap().len(), 2);
    assert_eq!(json["unsafe_files"].as_array().unwrap().len(), 0);
}

#[test]
fn test_verify_text_reports_unsafe_call() {
    let dir = compliant_repo();
    write(dir.path(), "tools/clone.py", UNSAFE_TOOL);
    let output = tribunal(dir.path(), &["verify", "."]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tools/clone.py:6"));
}

#[test]
fn test_verify_fail_unverified() {
    let dir = tempfile::tempdir().unwrap();
    let output = tribunal(dir.path(), &["verify", ".", "--format", "json", "--fail-unverified"]);
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["reason"], "Missing src/graph.py");
}

#[test]
fn test_audit_with_preproduced_opinions_markdown() {
    let dir = compliant_repo();
    write(dir.path(), "rubric.json", RUBRIC);
    write(
        dir.path(),
        "opinions.json",
        r#"[
            {"judge": "Prosecutor", "criterion_id": "langgraph_architecture", "score": 2, "argument": "No retries on judges.", "cited_evidence": ["repo_detective:0"]},
            {"judge": "Defense", "criterion_id": "langgraph_architecture", "score": 5, "argument": "Textbook fan-out.", "cited_evidence": ["repo_detective:0"]},
            {"judge": "TechLead", "criterion_id": "langgraph_architecture", "score": 4, "argument": "Solid.", "cited_evidence": []}
        ]"#,
    );

    let output = tribunal(
        dir.path(),
        &[
            "audit",
            ".",
            "--rubric",
            "rubric.json",
            "--opinions",
            "opinions.json",
            "--format",
            "markdown",
            "-o",
            "AUDIT.md",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let md = std::fs::read_to_string(dir.path().join("AUDIT.md")).unwrap();
    assert!(md.starts_with("# Audit Report"));
    assert!(md.contains("Judicial opinions received=3."));
    assert!(md.contains("> **Dissent:** Prosecutor scored 2/5 emphasizing: No retries on judges."));
    assert!(md.contains("Missing judge output for security_sandboxing."));
}

#[test]
fn test_audit_json_with_deterministic_judges() {
    let dir = compliant_repo();
    write(dir.path(), "rubric.json", RUBRIC);
    let output = tribunal(dir.path(), &["audit", ".", "--rubric", "rubric.json"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["criteria"].as_array().unwrap().len(), 2);
    assert_eq!(json["criteria"][0]["criterion_id"], "langgraph_architecture");
    assert!(json["executive_summary"]
        .as_str()
        .unwrap()
        .contains("Judicial opinions received=6."));
}

#[test]
fn test_audit_missing_rubric_fails() {
    let dir = compliant_repo();
    let output = tribunal(dir.path(), &["audit", ".", "--rubric", "nope.json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Rubric file not found"));
}

#[cfg(unix)]
#[test]
fn test_audit_with_judge_command() {
    let dir = compliant_repo();
    write(dir.path(), "rubric.json", RUBRIC);
    let reply = r#"cat > /dev/null; echo '{"score": 5, "argument": "Verified wiring.", "cited_evidence": ["[repo_detective:0]"]}'"#;
    let output = tribunal(
        dir.path(),
        &["audit", ".", "--rubric", "rubric.json", "--judge-command", "sh", "-c", reply],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["overall_score"], 5);
    assert_eq!(json["criteria"][0]["final_score"], 5);
    assert_eq!(json["criteria"][0]["strengths"][0], "Prosecutor: Verified wiring.");
}
