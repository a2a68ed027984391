//! State definition detectors: typed state record and merge reducers.

use crate::parsers::python::{class_definitions, field_annotations};
use crate::parsers::ParsedSource;

/// Conventional names for the shared workflow state
pub const STATE_TYPE_NAMES: [&str; 3] = ["AgentState", "GraphState", "State"];

const TYPED_MAPPING_BASE: &str = "TypedDict";
const UNION_OPERATOR: &str = "operator.ior";
const APPEND_OPERATOR: &str = "operator.add";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedState {
    /// Matching state classes in definition order
    pub state_types: Vec<String>,
}

/// State classes deriving from `TypedDict` (bare or dotted).
pub fn typed_state(source: &ParsedSource) -> TypedState {
    let state_types = class_definitions(source)
        .into_iter()
        .filter(|class| STATE_TYPE_NAMES.contains(&class.name.as_str()))
        .filter(|class| {
            class.bases.iter().any(|base| {
                base.rsplit('.').next() == Some(TYPED_MAPPING_BASE)
            })
        })
        .map(|class| class.name)
        .collect();
    TypedState { state_types }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReducerUsage {
    pub union: bool,
    pub append: bool,
}

/// Merge operators referenced in any field annotation.
pub fn reducers(source: &ParsedSource) -> ReducerUsage {
    let mut usage = ReducerUsage::default();
    for field in field_annotations(source) {
        for reference in &field.references {
            match reference.as_str() {
                UNION_OPERATOR => usage.union = true,
                APPEND_OPERATOR => usage.append = true,
                _ => {}
            }
        }
    }
    usage
}
