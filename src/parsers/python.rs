//! Python parser using tree-sitter
//!
//! Parses Python source and extracts the syntactic shapes the detectors need:
//! call sites with their literal arguments, class definitions with their
//! bases, and annotated field assignments.

use super::{walk_nodes, ParsedSource};
use anyhow::{bail, Context, Result};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Parse a Python file. `display_path` is recorded on the result.
pub fn parse_file(path: &Path, display_path: impl Into<String>) -> Result<ParsedSource> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    parse_source(source, display_path)
}

/// Parse Python source code directly.
///
/// A tree containing syntax errors is rejected, matching what the Python
/// compiler itself would accept.
pub fn parse_source(source: impl Into<String>, path: impl Into<String>) -> Result<ParsedSource> {
    let source = source.into();
    let path = path.into();

    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser
        .set_language(&language.into())
        .context("Failed to set Python language")?;

    let tree = parser
        .parse(&source, None)
        .context("Failed to parse Python source")?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(1);
        bail!("Syntax error in {} near line {}", path, line);
    }

    Ok(ParsedSource { path, source, tree })
}

fn first_error_line(root: Node) -> Option<u32> {
    let mut line = None;
    walk_nodes(root, |node| {
        if line.is_none() && (node.is_error() || node.is_missing()) {
            line = Some(node.start_position().row as u32 + 1);
        }
    });
    line
}

/// A call argument, reduced to what can be recognized literally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Bare name, e.g. `START`
    Identifier(String),
    /// Plain string literal without interpolation
    Str(String),
    /// `True` / `False`
    Bool(bool),
    /// Anything else: calls, f-strings, attributes, arithmetic...
    Other,
}

impl ArgValue {
    /// Text of a name or string literal, the two ways graph nodes get named.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            ArgValue::Identifier(s) | ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// One call expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Callee as written, whitespace removed (e.g. `builder.add_edge`, `os.system`)
    pub callee: String,
    /// Last segment of the callee (e.g. `add_edge`)
    pub method: String,
    /// Positional arguments in order
    pub args: Vec<ArgValue>,
    /// Keyword arguments in order
    pub keywords: Vec<(String, ArgValue)>,
    /// `*args` / `**kwargs` present
    pub has_splat: bool,
    /// 1-based line of the call
    pub line: u32,
}

impl CallSite {
    pub fn arg(&self, index: usize) -> Option<&ArgValue> {
        self.args.get(index)
    }

    pub fn keyword(&self, name: &str) -> Option<&ArgValue> {
        self.keywords
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

/// Extract every call expression in document order.
pub fn call_sites(parsed: &ParsedSource) -> Vec<CallSite> {
    let mut calls = Vec::new();
    walk_nodes(parsed.root(), |node| {
        if node.kind() == "call" {
            if let Some(call) = parse_call(parsed, node) {
                calls.push(call);
            }
        }
    });
    calls
}

fn parse_call(parsed: &ParsedSource, node: Node) -> Option<CallSite> {
    let func = node.child_by_field_name("function")?;
    let method = match func.kind() {
        "identifier" => parsed.text(func).to_string(),
        "attribute" => parsed
            .text(func.child_by_field_name("attribute")?)
            .to_string(),
        _ => return None,
    };
    let callee: String = parsed
        .text(func)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut call = CallSite {
        callee,
        method,
        args: Vec::new(),
        keywords: Vec::new(),
        has_splat: false,
        line: node.start_position().row as u32 + 1,
    };

    // `f(x for x in y)` carries a generator_expression instead of an argument_list
    let Some(arguments) = node.child_by_field_name("arguments") else {
        return Some(call);
    };
    if arguments.kind() != "argument_list" {
        call.args.push(ArgValue::Other);
        return Some(call);
    }

    for arg in arguments.named_children(&mut arguments.walk()) {
        match arg.kind() {
            "comment" => {}
            "keyword_argument" => {
                let name = arg
                    .child_by_field_name("name")
                    .map(|n| parsed.text(n).to_string())
                    .unwrap_or_default();
                let value = arg
                    .child_by_field_name("value")
                    .map(|v| arg_value(parsed, v))
                    .unwrap_or(ArgValue::Other);
                call.keywords.push((name, value));
            }
            "list_splat" | "dictionary_splat" => call.has_splat = true,
            _ => call.args.push(arg_value(parsed, arg)),
        }
    }

    Some(call)
}

fn arg_value(parsed: &ParsedSource, node: Node) -> ArgValue {
    match node.kind() {
        "identifier" => ArgValue::Identifier(parsed.text(node).to_string()),
        "true" => ArgValue::Bool(true),
        "false" => ArgValue::Bool(false),
        "string" => string_literal(parsed, node).map_or(ArgValue::Other, ArgValue::Str),
        "parenthesized_expression" => node
            .named_child(0)
            .map_or(ArgValue::Other, |inner| arg_value(parsed, inner)),
        _ => ArgValue::Other,
    }
}

/// Content of a plain string literal; `None` for f-strings with interpolation.
fn string_literal(parsed: &ParsedSource, node: Node) -> Option<String> {
    let mut content = String::new();
    for child in node.children(&mut node.walk()) {
        match child.kind() {
            "interpolation" => return None,
            "string_content" => content.push_str(parsed.text(child)),
            _ => {}
        }
    }
    Some(content)
}

/// A class definition with its declared bases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    /// Base expressions as written (`TypedDict`, `typing.TypedDict`, `Generic`)
    pub bases: Vec<String>,
    pub line: u32,
}

/// Extract class definitions at any depth.
pub fn class_definitions(parsed: &ParsedSource) -> Vec<ClassDef> {
    let mut classes = Vec::new();
    walk_nodes(parsed.root(), |node| {
        if node.kind() != "class_definition" {
            return;
        }
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let bases = node
            .child_by_field_name("superclasses")
            .map(|list| {
                list.named_children(&mut list.walk())
                    .filter_map(|arg| base_name(parsed, arg))
                    .collect()
            })
            .unwrap_or_default();
        classes.push(ClassDef {
            name: parsed.text(name_node).to_string(),
            bases,
            line: node.start_position().row as u32 + 1,
        });
    });
    classes
}

fn base_name(parsed: &ParsedSource, node: Node) -> Option<String> {
    match node.kind() {
        "identifier" | "attribute" => Some(parsed.text(node).to_string()),
        // Generic[T] - just get the base
        "subscript" => node
            .child_by_field_name("value")
            .and_then(|n| base_name(parsed, n)),
        // Skip keyword args like total=False / metaclass=...
        _ => None,
    }
}

/// An annotated assignment such as `evidences: Annotated[Dict, operator.ior]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAnnotation {
    pub field: String,
    /// Dotted names and bare names referenced inside the annotation
    pub references: Vec<String>,
    pub line: u32,
}

/// Extract annotated assignments at any depth (class bodies and module level).
pub fn field_annotations(parsed: &ParsedSource) -> Vec<FieldAnnotation> {
    let mut fields = Vec::new();
    walk_nodes(parsed.root(), |node| {
        if node.kind() != "assignment" {
            return;
        }
        let Some(annotation) = node.child_by_field_name("type") else {
            return;
        };
        let field = node
            .child_by_field_name("left")
            .map(|n| parsed.text(n).to_string())
            .unwrap_or_default();

        let mut references = Vec::new();
        walk_nodes(annotation, |inner| match inner.kind() {
            "attribute" | "identifier" => {
                let text: String = parsed
                    .text(inner)
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                references.push(text);
            }
            _ => {}
        });

        fields.push(FieldAnnotation {
            field,
            references,
            line: node.start_position().row as u32 + 1,
        });
    });
    fields
}
