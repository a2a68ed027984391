//! Source parsing using tree-sitter
//!
//! The audited repositories are Python projects, so this module carries a
//! single grammar. [`SourceScanner`] walks a repository and yields parsed
//! files; [`python`] turns one file into a [`ParsedSource`] and offers the
//! syntactic views (call sites, class definitions, field annotations) the
//! pattern detectors work from.

pub mod python;
mod scanner;

pub use python::{parse_file, parse_source};
pub use scanner::{
    load, ScanEntry, ScanOptions, SkippedFile, SourceScanner, DEFAULT_EXCLUDE_DIRS,
    DEFAULT_EXTENSIONS,
};

use tree_sitter::{Node, Tree};

/// A successfully parsed source file
#[derive(Debug, Clone)]
pub struct ParsedSource {
    /// Path relative to the scan root, `/`-separated
    pub path: String,
    /// Full source text
    pub source: String,
    /// tree-sitter syntax tree over `source`
    pub tree: Tree,
}

impl ParsedSource {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text of a node, or "" if the node spans invalid UTF-8.
    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

/// Visit every node below `root` in document (pre-)order.
///
/// Uses an explicit stack so deeply nested or malformed trees cannot
/// overflow the call stack.
pub fn walk_nodes<'a>(root: Node<'a>, mut visit: impl FnMut(Node<'a>)) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        visit(node);
        let count = node.child_count();
        for i in (0..count).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
}
