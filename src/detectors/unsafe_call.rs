//! Unsafe process execution detector
//!
//! Recognition is purely syntactic. What counts as literal is the call shape,
//! not its argument: `os.system(x)` with exactly one positional argument is
//! flagged whether `x` is a constant string like `"rm -rf /"` or a variable.
//! Subprocess-style calls are flagged only when `shell=True` is written
//! literally at the call site. `shell=use_shell` or `**opts` are not followed.

use crate::parsers::python::{call_sites, ArgValue, CallSite};
use crate::parsers::ParsedSource;
use serde::{Deserialize, Serialize};

const DIRECT_SHELL_CALLEES: &[&str] = &["os.system"];

const SUBPROCESS_CALLEES: &[&str] = &[
    "subprocess.run",
    "subprocess.call",
    "subprocess.Popen",
    "subprocess.check_call",
    "subprocess.check_output",
];

const SHELL_KEYWORD: &str = "shell";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsafeCallKind {
    /// Single-argument direct shell call (`os.system(cmd)`)
    DirectShell,
    /// Subprocess call with a literal `shell=True`
    ShellTrue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsafeCall {
    pub kind: UnsafeCallKind,
    pub callee: String,
    pub line: u32,
}

fn classify(call: &CallSite) -> Option<UnsafeCallKind> {
    let callee = call.callee.as_str();
    if DIRECT_SHELL_CALLEES.contains(&callee)
        && call.args.len() == 1
        && call.keywords.is_empty()
        && !call.has_splat
    {
        return Some(UnsafeCallKind::DirectShell);
    }
    if SUBPROCESS_CALLEES.contains(&callee)
        && call.keyword(SHELL_KEYWORD) == Some(&ArgValue::Bool(true))
    {
        return Some(UnsafeCallKind::ShellTrue);
    }
    None
}

/// Every unsafe call in the file, in document order.
pub fn unsafe_calls(source: &ParsedSource) -> Vec<UnsafeCall> {
    call_sites(source)
        .iter()
        .filter_map(|call| {
            classify(call).map(|kind| UnsafeCall {
                kind,
                callee: call.callee.clone(),
                line: call.line,
            })
        })
        .collect()
}
