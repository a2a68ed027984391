//! Architectural pattern detectors
//!
//! Each detector is a pure function over one [`ParsedSource`]. They share no
//! state, so any subset can run in any order or in parallel.
//!
//! # Registry
//!
//! ```text
//! PatternDetector::ALL
//!   StartFanout   -> DetectorOutcome::StartFanout { count, targets, parallel }
//!   TypedState    -> DetectorOutcome::TypedState  { present, state_types }
//!   Reducers      -> DetectorOutcome::Reducers    { union, append }
//!   FanIn         -> DetectorOutcome::FanIn       { first, second, judge_edges, judge_fanout }
//!   Edges         -> DetectorOutcome::Edges       { conditional, terminal }
//!   UnsafeCalls   -> DetectorOutcome::UnsafeCalls(Vec<UnsafeCall>)
//! ```
//!
//! Malformed or unrelated input never produces an error; it just produces
//! the "nothing found" outcome.

mod graph_edges;
mod state_shape;
mod unsafe_call;

pub use graph_edges::{
    conditional_edges, fan_in, start_fanout, terminal_edge, FanInReport, StartFanout,
    AGGREGATOR_NODES, JUDGE_NODES,
};
pub use state_shape::{reducers, typed_state, ReducerUsage, TypedState, STATE_TYPE_NAMES};
pub use unsafe_call::{unsafe_calls, UnsafeCall, UnsafeCallKind};

use crate::parsers::ParsedSource;
use serde::Serialize;

/// The closed set of detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternDetector {
    StartFanout,
    TypedState,
    Reducers,
    FanIn,
    Edges,
    UnsafeCalls,
}

/// Result of running one [`PatternDetector`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "detector", content = "result", rename_all = "snake_case")]
pub enum DetectorOutcome {
    StartFanout {
        count: usize,
        targets: Vec<String>,
        parallel: bool,
    },
    TypedState {
        present: bool,
        state_types: Vec<String>,
    },
    Reducers {
        union: bool,
        append: bool,
    },
    FanIn {
        first: bool,
        second: bool,
        judge_edges: Vec<(String, String)>,
        judge_fanout: bool,
    },
    Edges {
        conditional: bool,
        terminal: bool,
    },
    UnsafeCalls(Vec<UnsafeCall>),
}

impl PatternDetector {
    pub const ALL: [PatternDetector; 6] = [
        PatternDetector::StartFanout,
        PatternDetector::TypedState,
        PatternDetector::Reducers,
        PatternDetector::FanIn,
        PatternDetector::Edges,
        PatternDetector::UnsafeCalls,
    ];

    /// Detectors that read the workflow definition file
    pub const WORKFLOW: [PatternDetector; 3] = [
        PatternDetector::StartFanout,
        PatternDetector::FanIn,
        PatternDetector::Edges,
    ];

    /// Detectors that read the state definition file
    pub const STATE: [PatternDetector; 2] = [PatternDetector::TypedState, PatternDetector::Reducers];

    pub fn name(&self) -> &'static str {
        match self {
            PatternDetector::StartFanout => "start-fanout",
            PatternDetector::TypedState => "typed-state",
            PatternDetector::Reducers => "reducers",
            PatternDetector::FanIn => "fan-in",
            PatternDetector::Edges => "edges",
            PatternDetector::UnsafeCalls => "unsafe-calls",
        }
    }

    pub fn run(&self, source: &ParsedSource) -> DetectorOutcome {
        match self {
            PatternDetector::StartFanout => {
                let StartFanout { count, targets } = start_fanout(source);
                DetectorOutcome::StartFanout {
                    parallel: count >= 2,
                    count,
                    targets,
                }
            }
            PatternDetector::TypedState => {
                let TypedState { state_types } = typed_state(source);
                DetectorOutcome::TypedState {
                    present: !state_types.is_empty(),
                    state_types,
                }
            }
            PatternDetector::Reducers => {
                let ReducerUsage { union, append } = reducers(source);
                DetectorOutcome::Reducers { union, append }
            }
            PatternDetector::FanIn => {
                let report = fan_in(source);
                DetectorOutcome::FanIn {
                    judge_fanout: report.judge_fanout(),
                    first: report.first_aggregator,
                    second: report.second_aggregator,
                    judge_edges: report.judge_edges,
                }
            }
            PatternDetector::Edges => DetectorOutcome::Edges {
                conditional: conditional_edges(source),
                terminal: terminal_edge(source),
            },
            PatternDetector::UnsafeCalls => DetectorOutcome::UnsafeCalls(unsafe_calls(source)),
        }
    }
}

impl std::fmt::Display for PatternDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
