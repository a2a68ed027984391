//! Repository walking
//!
//! Yields every whitelisted source file under a root, parsed, in a stable
//! order. Files that fail to read or parse are reported as skipped instead of
//! aborting the walk.

use super::{python, ParsedSource};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directories never descended into
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "venv",
    ".venv",
    "env",
    ".env",
    "node_modules",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    ".tox",
    ".nox",
    "build",
    "dist",
    "site-packages",
    ".eggs",
];

/// Extensions considered source files
pub const DEFAULT_EXTENSIONS: &[&str] = &["py", "pyi"];

/// What to walk and what to leave out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
    /// Relative paths (`/`-separated) skipped entirely
    pub exclude_paths: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            exclude_paths: Vec::new(),
        }
    }
}

/// A file the scanner could not use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// One step of a scan
#[derive(Debug)]
pub enum ScanEntry {
    Parsed(ParsedSource),
    Skipped(SkippedFile),
}

/// Walks a repository root with a fixed set of [`ScanOptions`]
#[derive(Debug, Clone)]
pub struct SourceScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl SourceScanner {
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate files as `(absolute, relative)` pairs, lazily, sorted by
    /// file name at every directory level.
    pub fn walk(&self) -> impl Iterator<Item = (PathBuf, String)> + '_ {
        let exclude_dirs = self.options.exclude_dirs.clone();

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .hidden(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| exclude_dirs.iter().any(|d| d == name)))
            })
            .build();

        walker
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Walk error under {}: {}", self.root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter(|entry| self.has_scanned_extension(entry.path()))
            .filter_map(|entry| {
                let relative = self.relative_path(entry.path())?;
                if self.options.exclude_paths.iter().any(|p| p == &relative) {
                    debug!("Excluded by configuration: {}", relative);
                    return None;
                }
                Some((entry.into_path(), relative))
            })
    }

    /// All candidate paths, collected (for parallel fan-out).
    pub fn candidate_paths(&self) -> Vec<(PathBuf, String)> {
        self.walk().collect()
    }

    /// Lazily parse every candidate file.
    pub fn scan(&self) -> impl Iterator<Item = ScanEntry> + '_ {
        self.walk().map(|(path, relative)| load(&path, relative))
    }

    fn has_scanned_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.options.extensions.iter().any(|x| x == ext))
    }

    /// Path relative to the root with `/` separators.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

/// Read and parse one file, converting any failure into a skip.
pub fn load(path: &Path, relative: String) -> ScanEntry {
    match python::parse_file(path, relative.clone()) {
        Ok(parsed) => ScanEntry::Parsed(parsed),
        Err(e) => {
            let reason = format!("{:#}", e);
            warn!("Skipping {}: {}", relative, reason);
            ScanEntry::Skipped(SkippedFile {
                path: relative,
                reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/graph.py", b"x = 1\n");
        write(root, "src/a.py", b"y = 2\n");
        write(root, "src/broken.py", b"def f(:\n");
        write(root, "src/bytes.py", &[0xff, 0xfe, 0x00]);
        write(root, "README.md", b"# readme\n");
        write(root, ".venv/lib/site.py", b"z = 3\n");
        write(root, "pkg/__pycache__/c.py", b"z = 3\n");
        write(root, "stubs/types.pyi", b"def f() -> int: ...\n");
        dir
    }

    #[test]
    fn test_walk_is_sorted_and_filtered() {
        let dir = fixture();
        let scanner = SourceScanner::new(dir.path(), ScanOptions::default());
        let paths: Vec<String> = scanner.walk().map(|(_, rel)| rel).collect();
        assert_eq!(
            paths,
            vec![
                "src/a.py",
                "src/broken.py",
                "src/bytes.py",
                "src/graph.py",
                "stubs/types.pyi"
            ]
        );
    }

    #[test]
    fn test_scan_skips_failures_and_continues() {
        let dir = fixture();
        let scanner = SourceScanner::new(dir.path(), ScanOptions::default());
        let mut parsed = Vec::new();
        let mut skipped = Vec::new();
        for entry in scanner.scan() {
            match entry {
                ScanEntry::Parsed(p) => parsed.push(p.path),
                ScanEntry::Skipped(s) => skipped.push(s.path),
            }
        }
        assert_eq!(parsed, vec!["src/a.py", "src/graph.py", "stubs/types.pyi"]);
        assert_eq!(skipped, vec!["src/broken.py", "src/bytes.py"]);
    }

    #[test]
    fn test_exclude_paths() {
        let dir = fixture();
        let options = ScanOptions {
            exclude_paths: vec!["src/a.py".to_string()],
            ..Default::default()
        };
        let scanner = SourceScanner::new(dir.path(), options);
        let paths: Vec<String> = scanner.walk().map(|(_, rel)| rel).collect();
        assert!(!paths.contains(&"src/a.py".to_string()));
        assert!(paths.contains(&"src/graph.py".to_string()));
    }

    #[test]
    fn test_root_named_like_excluded_dir_is_still_walked() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("build");
        write(&root, "main.py", b"x = 1\n");
        let scanner = SourceScanner::new(&root, ScanOptions::default());
        assert_eq!(scanner.candidate_paths().len(), 1);
    }
}
