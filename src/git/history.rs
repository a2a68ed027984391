//! Commit history using libgit2

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use git2::{Repository, Sort};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One commit, as reported in forensic results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Short hash (12 characters)
    pub id: String,
    /// Commit timestamp (RFC 3339, UTC)
    pub timestamp: String,
    pub author: String,
    /// First line of the commit message
    pub message: String,
}

pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    /// Open the repository rooted exactly at `path`.
    ///
    /// Parent directories are not searched, so a snapshot without its own
    /// `.git` never picks up an enclosing checkout's history.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path)
            .with_context(|| format!("Failed to open git repository at {:?}", path))?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self { repo })
    }

    /// The most recent `max_commits` commits reachable from HEAD, oldest first.
    pub fn chronological(&self, max_commits: usize) -> Result<Vec<CommitSummary>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
        revwalk
            .push_head()
            .context("Repository has no HEAD (no commits yet?)")?;

        let mut commits = Vec::new();
        for oid_result in revwalk.take(max_commits) {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;
            commits.push(summarize(&commit));
        }

        commits.reverse();
        Ok(commits)
    }
}

fn summarize(commit: &git2::Commit) -> CommitSummary {
    let author = commit.author();
    let id = commit.id().to_string();
    CommitSummary {
        id: id.chars().take(12).collect(),
        timestamp: format_git_time(&commit.time()),
        author: author.name().unwrap_or("Unknown").to_string(),
        message: commit
            .message()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .to_string(),
    }
}

/// Format a git timestamp as ISO 8601.
fn format_git_time(time: &git2::Time) -> String {
    match Utc.timestamp_opt(time.seconds(), 0).single() {
        Some(dt) => dt.to_rfc3339(),
        None => "1970-01-01T00:00:00Z".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Signature, Time};
    use tempfile::tempdir;

    fn commit_file(
        repo: &Repository,
        dir: &Path,
        name: &str,
        message: &str,
        seconds: i64,
    ) -> Result<()> {
        let sig = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0))?;
        std::fs::write(dir.join(name), message)?;
        let mut index = repo.index()?;
        index.add_path(Path::new(name))?;
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;
        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit()?],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)?;
        Ok(())
    }

    #[test]
    fn test_history_is_oldest_first() -> Result<()> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        commit_file(&repo, dir.path(), "a.txt", "Initial commit", 1_700_000_000)?;
        commit_file(&repo, dir.path(), "b.txt", "Add state\n\nbody", 1_700_000_100)?;
        commit_file(&repo, dir.path(), "c.txt", "Wire graph", 1_700_000_200)?;

        let history = GitHistory::open(dir.path())?;
        let commits = history.chronological(10)?;
        let messages: Vec<&str> = commits.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["Initial commit", "Add state", "Wire graph"]);
        assert_eq!(commits[0].author, "Test User");
        assert_eq!(commits[0].id.len(), 12);
        assert!(commits[0].timestamp.starts_with("2023-11-14T22:13:20"));
        Ok(())
    }

    #[test]
    fn test_history_limit_keeps_most_recent() -> Result<()> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        commit_file(&repo, dir.path(), "a.txt", "one", 1_700_000_000)?;
        commit_file(&repo, dir.path(), "b.txt", "two", 1_700_000_100)?;
        commit_file(&repo, dir.path(), "c.txt", "three", 1_700_000_200)?;

        let commits = GitHistory::open(dir.path())?.chronological(2)?;
        let messages: Vec<&str> = commits.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
        Ok(())
    }

    #[test]
    fn test_not_a_repo() -> Result<()> {
        let dir = tempdir()?;
        assert!(GitHistory::open(dir.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_empty_repo_has_no_head() -> Result<()> {
        let dir = tempdir()?;
        Repository::init(dir.path())?;
        let history = GitHistory::open(dir.path())?;
        assert!(history.chronological(10).is_err());
        Ok(())
    }
}
