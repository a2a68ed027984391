//! Graph wiring detectors: start fan-out, aggregator fan-in, judge fan-out,
//! conditional and terminal edges.

use crate::parsers::python::{call_sites, ArgValue, CallSite};
use crate::parsers::ParsedSource;
use std::collections::BTreeSet;

const ADD_EDGE: &str = "add_edge";
const ADD_NODE: &str = "add_node";
const ADD_CONDITIONAL_EDGES: &str = "add_conditional_edges";

/// `(first, second)` aggregator node names
pub const AGGREGATOR_NODES: (&str, &str) = ("evidence_aggregator", "opinion_aggregator");

/// Downstream role nodes the first aggregator should feed
pub const JUDGE_NODES: [&str; 3] = ["prosecutor", "defense", "techlead"];

fn is_start(arg: &ArgValue) -> bool {
    matches!(arg, ArgValue::Identifier(s) if s == "START")
        || matches!(arg, ArgValue::Str(s) if s == "__start__")
}

fn is_end(arg: &ArgValue) -> bool {
    matches!(arg, ArgValue::Identifier(s) if s == "END")
        || matches!(arg, ArgValue::Str(s) if s == "__end__")
}

fn edges(source: &ParsedSource) -> impl Iterator<Item = CallSite> {
    call_sites(source)
        .into_iter()
        .filter(|call| call.method == ADD_EDGE)
}

/// Edges leaving the start sentinel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartFanout {
    pub count: usize,
    /// Destination names in registration order (unnamed destinations omitted)
    pub targets: Vec<String>,
}

/// Count `add_edge(START, ...)` registrations.
///
/// Only the first positional argument is the edge source; a sentinel in any
/// other position does not count.
pub fn start_fanout(source: &ParsedSource) -> StartFanout {
    let mut fanout = StartFanout::default();
    for call in edges(source) {
        if call.arg(0).is_some_and(is_start) {
            fanout.count += 1;
            if let Some(target) = call.arg(1).and_then(ArgValue::as_name) {
                fanout.targets.push(target.to_string());
            }
        }
    }
    fanout
}

/// Aggregator registration and the judge edges leaving the first aggregator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanInReport {
    pub first_aggregator: bool,
    pub second_aggregator: bool,
    /// `(aggregator, judge)` edges, deduplicated, in registration order
    pub judge_edges: Vec<(String, String)>,
}

impl FanInReport {
    /// At least two distinct judge roles hang off the first aggregator.
    pub fn judge_fanout(&self) -> bool {
        let roles: BTreeSet<&str> = self.judge_edges.iter().map(|(_, to)| to.as_str()).collect();
        roles.len() >= 2
    }
}

pub fn fan_in(source: &ParsedSource) -> FanInReport {
    let (first, second) = AGGREGATOR_NODES;
    let mut report = FanInReport::default();

    for call in call_sites(source) {
        match call.method.as_str() {
            ADD_NODE => match call.arg(0).and_then(ArgValue::as_name) {
                Some(name) if name == first => report.first_aggregator = true,
                Some(name) if name == second => report.second_aggregator = true,
                _ => {}
            },
            ADD_EDGE => {
                let from = call.arg(0).and_then(ArgValue::as_name);
                let to = call.arg(1).and_then(ArgValue::as_name);
                if let (Some(from), Some(to)) = (from, to) {
                    if from == first && JUDGE_NODES.contains(&to) {
                        let edge = (from.to_string(), to.to_string());
                        if !report.judge_edges.contains(&edge) {
                            report.judge_edges.push(edge);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    report
}

/// Any `add_conditional_edges(...)` registration.
pub fn conditional_edges(source: &ParsedSource) -> bool {
    call_sites(source)
        .iter()
        .any(|call| call.method == ADD_CONDITIONAL_EDGES)
}

/// Any `add_edge(_, END)` registration.
pub fn terminal_edge(source: &ParsedSource) -> bool {
    edges(source).any(|call| call.arg(1).is_some_and(is_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse_source;

    fn parse(source: &str) -> ParsedSource {
        parse_source(source, "src/graph.py").unwrap()
    }

    #[test]
    fn test_no_start_edges() {
        let parsed = parse("builder.add_edge('a', 'b')\nbuilder.add_edge('b', END)\n");
        let fanout = start_fanout(&parsed);
        assert_eq!(fanout.count, 0);
        assert!(fanout.targets.is_empty());
    }

    #[test]
    fn test_two_start_edges() {
        let parsed = parse(
            "g.add_edge(START, 'repo_detective')\ng.add_edge('__start__', doc_detective)\n",
        );
        let fanout = start_fanout(&parsed);
        assert_eq!(fanout.count, 2);
        assert_eq!(fanout.targets, vec!["repo_detective", "doc_detective"]);
    }

    #[test]
    fn test_start_in_other_position_does_not_count() {
        let parsed = parse(
            "g.add_edge('a', START)\ng.add_edge(source=START, target='b')\ng.add_node(START)\n",
        );
        assert_eq!(start_fanout(&parsed).count, 0);
    }

    #[test]
    fn test_start_like_strings_do_not_count() {
        let parsed = parse("g.add_edge('START', 'a')\ng.add_edge(graph.START, 'b')\n");
        assert_eq!(start_fanout(&parsed).count, 0);
    }

    #[test]
    fn test_fan_in_and_judge_fanout() {
        let parsed = parse(
            r#"
g.add_node("evidence_aggregator", collect)
g.add_node("opinion_aggregator", collect_opinions)
g.add_edge("evidence_aggregator", "prosecutor")
g.add_edge("evidence_aggregator", "prosecutor")
g.add_edge("evidence_aggregator", "defense")
g.add_edge("repo_detective", "techlead")
"#,
        );
        let report = fan_in(&parsed);
        assert!(report.first_aggregator);
        assert!(report.second_aggregator);
        assert_eq!(
            report.judge_edges,
            vec![
                ("evidence_aggregator".to_string(), "prosecutor".to_string()),
                ("evidence_aggregator".to_string(), "defense".to_string()),
            ]
        );
        assert!(report.judge_fanout());
    }

    #[test]
    fn test_single_judge_is_not_fanout() {
        let parsed = parse("g.add_edge('evidence_aggregator', 'techlead')\n");
        let report = fan_in(&parsed);
        assert!(!report.first_aggregator);
        assert!(!report.judge_fanout());
    }

    #[test]
    fn test_conditional_and_terminal() {
        let parsed = parse("g.add_conditional_edges('a', route)\ng.add_edge('z', '__end__')\n");
        assert!(conditional_edges(&parsed));
        assert!(terminal_edge(&parsed));

        let parsed = parse("g.add_edge(END, 'a')\n");
        assert!(!conditional_edges(&parsed));
        assert!(!terminal_edge(&parsed));
    }
}
