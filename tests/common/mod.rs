//! Shared fixtures for integration tests

#![allow(dead_code)]

use git2::{Repository, Signature, Time};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const GRAPH: &str = r#"
from langgraph.graph import StateGraph, START, END

from src.state import AgentState

builder = StateGraph(AgentState)
builder.add_node("repo_detective", repo_detective)
builder.add_node("doc_detective", doc_detective)
builder.add_node("evidence_aggregator", aggregate_evidence)
builder.add_node("opinion_aggregator", aggregate_opinions)
builder.add_edge(START, "repo_detective")
builder.add_edge(START, "doc_detective")
builder.add_edge("repo_detective", "evidence_aggregator")
builder.add_edge("doc_detective", "evidence_aggregator")
builder.add_edge("evidence_aggregator", "prosecutor")
builder.add_edge("evidence_aggregator", "defense")
builder.add_edge("evidence_aggregator", "techlead")
builder.add_conditional_edges("opinion_aggregator", route_after_opinions)
builder.add_edge("chief_justice", END)
graph = builder.compile()
"#;

pub const STATE: &str = r#"
import operator
from typing import Annotated, Dict, List, TypedDict


class AgentState(TypedDict):
    repo_url: str
    evidences: Annotated[Dict[str, list], operator.ior]
    opinions: Annotated[List[dict], operator.add]
"#;

pub const UNSAFE_TOOL: &str = r#"
import os


def clone(url):
    os.system("git clone " + url)
"#;

pub const RUBRIC: &str = r#"{
  "rubric_metadata": {"rubric_name": "Integration rubric", "version": "1.0"},
  "dimensions": [
    {"id": "langgraph_architecture", "name": "Graph Orchestration", "weight": 2},
    {"id": "security_sandboxing", "name": "Sandboxed Tooling", "weight": 1}
  ],
  "synthesis_rules": {
    "security_override": "decrement",
    "fact_supremacy": true
  }
}"#;

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Repository with a compliant graph and state, not under git
pub fn compliant_repo() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/graph.py", GRAPH);
    write(dir.path(), "src/state.py", STATE);
    dir
}

/// Commit every file in the working tree as `message` at `seconds`
pub fn commit_all(repo: &Repository, message: &str, seconds: i64) {
    let sig = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0)).unwrap();
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap();
}

/// Compliant repository with two commits of history
pub fn compliant_git_repo() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    write(dir.path(), "src/state.py", STATE);
    commit_all(&repo, "Add typed state", 1_700_000_000);
    write(dir.path(), "src/graph.py", GRAPH);
    commit_all(&repo, "Wire parallel graph", 1_700_000_600);
    dir
}
