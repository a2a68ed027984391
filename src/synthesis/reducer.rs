//! Per-criterion reduction of judge opinions

use crate::models::{clamp_score, CriterionResult, Evidence, Judge, Opinion, MIN_SCORE};
use crate::rubric::{FactSupremacy, RubricCriterion};

const ARGUMENT_CHARS: usize = 180;
const DISSENT_ARGUMENT_CHARS: usize = 140;
const MAX_POINTS: usize = 3;
/// Ceiling imposed by a fact-supremacy override
pub const FACT_CEILING: u8 = 2;
/// Spread of scores at which judges are considered in dissent
pub const DISSENT_SPREAD: u8 = 2;

pub const UNSAFE_FACT_REASON: &str = "Fact supremacy: unsafe execution evidence confirmed.";
pub const STRUCTURAL_FACT_REASON: &str = "Fact supremacy: required graph/state evidence missing.";

const DEFAULT_REMEDIATION: [&str; 2] = [
    "Address judge weaknesses and add stronger evidence citations.",
    "Ensure report claims match repo implementation.",
];

/// Facts established by static verification, relevant to every criterion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Facts {
    pub unsafe_execution: bool,
    pub structural_failure: bool,
}

impl Facts {
    pub fn from_evidence<'a>(evidence: impl IntoIterator<Item = &'a Evidence>) -> Self {
        evidence.into_iter().fold(Facts::default(), |facts, ev| Facts {
            unsafe_execution: facts.unsafe_execution || ev.is_unsafe_execution_finding(),
            structural_failure: facts.structural_failure || ev.is_structural_failure(),
        })
    }

    /// The override reason for `criterion_id`, if any fact caps it.
    pub fn override_reason(&self, criterion_id: &str, rules: &FactSupremacy) -> Option<&'static str> {
        if self.unsafe_execution && rules.caps_on_unsafe_execution(criterion_id) {
            Some(UNSAFE_FACT_REASON)
        } else if self.structural_failure && rules.caps_on_structural_failure(criterion_id) {
            Some(STRUCTURAL_FACT_REASON)
        } else {
            None
        }
    }
}

/// Spread and mean of a non-empty score set
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoreStats {
    mean: f64,
    /// max - min
    variance: u8,
}

impl ScoreStats {
    fn of(first: &Opinion, rest: &[&Opinion]) -> Self {
        let (sum, min, max) = rest.iter().fold(
            (first.score as u32, first.score, first.score),
            |(sum, min, max), o| (sum + o.score as u32, min.min(o.score), max.max(o.score)),
        );
        Self {
            mean: sum as f64 / (rest.len() + 1) as f64,
            variance: max - min,
        }
    }
}

/// One criterion's result plus what it contributes to the report lists
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionReduction {
    pub result: CriterionResult,
    pub risks: Vec<String>,
    pub next_steps: Vec<String>,
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn point(opinion: &Opinion) -> String {
    format!(
        "{}: {}",
        opinion.judge,
        truncate_chars(opinion.argument.trim(), ARGUMENT_CHARS)
    )
}

fn dissent_text(opinions: &[&Opinion]) -> String {
    let prosecutor = opinions.iter().find(|o| o.judge == Judge::Prosecutor);
    let defense = opinions.iter().find(|o| o.judge == Judge::Defense);
    match (prosecutor, defense) {
        (Some(p), Some(d)) => format!(
            "Prosecutor scored {}/5 emphasizing: {}. Defense scored {}/5 emphasizing: {}.",
            p.score,
            truncate_chars(p.argument.trim(), DISSENT_ARGUMENT_CHARS),
            d.score,
            truncate_chars(d.argument.trim(), DISSENT_ARGUMENT_CHARS)
        ),
        _ => "High disagreement between judges. Review evidence grounding.".to_string(),
    }
}

fn missing_opinions(criterion_id: &str) -> CriterionReduction {
    CriterionReduction {
        result: CriterionResult {
            criterion_id: criterion_id.to_string(),
            final_score: MIN_SCORE,
            summary: "No judge opinions produced for this criterion.".to_string(),
            strengths: Vec::new(),
            weaknesses: vec!["Missing judge evaluation output.".to_string()],
            remediation: vec![
                "Ensure each judge produces an opinion for every rubric criterion.".to_string(),
            ],
            dissent: None,
        },
        risks: vec![format!("Missing judge output for {}.", criterion_id)],
        next_steps: Vec::new(),
    }
}

/// Reduce the opinions filed on one criterion, in input order.
///
/// `final_score` is the rounded mean, lowered by one when a Prosecutor
/// scored 2 or less amid a spread of 2 or more, then capped at 2 when a
/// relevant fact overrides the judges.
pub fn reduce_criterion(
    criterion: &RubricCriterion,
    opinions: &[&Opinion],
    facts: &Facts,
    rules: &FactSupremacy,
) -> CriterionReduction {
    let Some((first, rest)) = opinions.split_first() else {
        return missing_opinions(&criterion.id);
    };
    let id = criterion.id.as_str();
    let stats = ScoreStats::of(first, rest);

    let mut score = stats.mean.round_ties_even() as i64;
    let prosecutor_low = opinions
        .iter()
        .any(|o| o.judge == Judge::Prosecutor && o.score <= 2);
    if prosecutor_low && stats.variance >= DISSENT_SPREAD {
        score -= 1;
    }
    let mut final_score = clamp_score(score);

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    for opinion in opinions {
        if opinion.score >= 4 && strengths.len() < MAX_POINTS {
            strengths.push(point(opinion));
        } else if opinion.score <= 2 && weaknesses.len() < MAX_POINTS {
            weaknesses.push(point(opinion));
        }
    }

    let mut next_steps = Vec::new();
    let dissent = (stats.variance >= DISSENT_SPREAD).then(|| {
        next_steps.push(format!(
            "Resolve dissent in {}: tighten evidence grounding and judge prompts.",
            id
        ));
        dissent_text(opinions)
    });

    if let Some(reason) = facts.override_reason(id, rules) {
        final_score = final_score.min(FACT_CEILING);
        weaknesses.truncate(MAX_POINTS - 1);
        weaknesses.push(reason.to_string());
    }

    if final_score <= 3 {
        next_steps.push(format!(
            "Improve {}: add stronger citations and clearer cross-references (repo <-> report).",
            id
        ));
    }

    CriterionReduction {
        result: CriterionResult {
            criterion_id: id.to_string(),
            final_score,
            summary: format!(
                "Synthesized from {} opinion(s) (avg={:.2}, var={}).",
                opinions.len(),
                stats.mean,
                stats.variance
            ),
            strengths,
            weaknesses,
            remediation: DEFAULT_REMEDIATION.iter().map(|s| s.to_string()).collect(),
            dissent,
        },
        risks: Vec::new(),
        next_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(id: &str) -> RubricCriterion {
        RubricCriterion::new(id, 1.0)
    }

    fn op(judge: Judge, score: i64, argument: &str) -> Opinion {
        Opinion::new(judge, "c", score, argument)
    }

    fn reduce(opinions: &[Opinion]) -> CriterionReduction {
        let refs: Vec<&Opinion> = opinions.iter().collect();
        reduce_criterion(&criterion("c"), &refs, &Facts::default(), &FactSupremacy::default())
    }

    #[test]
    fn test_prosecutor_dissent_lowers_score() {
        let reduction = reduce(&[
            op(Judge::Prosecutor, 2, "No reducers on opinions."),
            op(Judge::Defense, 4, "Fan-out is wired."),
            op(Judge::TechLead, 3, "Acceptable."),
        ]);
        let result = &reduction.result;
        assert_eq!(result.final_score, 2);
        let dissent = result.dissent.as_deref().unwrap();
        assert!(dissent.contains("Prosecutor scored 2/5 emphasizing: No reducers on opinions."));
        assert!(dissent.contains("Defense scored 4/5 emphasizing: Fan-out is wired."));
        assert_eq!(result.summary, "Synthesized from 3 opinion(s) (avg=3.00, var=2).");
        assert_eq!(result.strengths, vec!["Defense: Fan-out is wired."]);
        assert_eq!(result.weaknesses, vec!["Prosecutor: No reducers on opinions."]);
        assert_eq!(
            reduction.next_steps,
            vec![
                "Resolve dissent in c: tighten evidence grounding and judge prompts.",
                "Improve c: add stronger citations and clearer cross-references (repo <-> report).",
            ]
        );
    }

    #[test]
    fn test_empty_opinions() {
        let reduction = reduce(&[]);
        assert_eq!(reduction.result.final_score, 1);
        assert_eq!(reduction.result.weaknesses, vec!["Missing judge evaluation output."]);
        assert_eq!(reduction.risks, vec!["Missing judge output for c."]);
        assert!(reduction.result.dissent.is_none());
    }

    #[test]
    fn test_agreement_has_no_dissent() {
        let reduction = reduce(&[
            op(Judge::Prosecutor, 4, "a"),
            op(Judge::Defense, 5, "b"),
            op(Judge::TechLead, 4, "c"),
        ]);
        assert_eq!(reduction.result.final_score, 4);
        assert!(reduction.result.dissent.is_none());
        assert!(reduction.next_steps.is_empty());
        assert_eq!(reduction.result.strengths.len(), 3);
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        // mean 2.5 rounds to 2, 3.5 rounds to 4
        let low = reduce(&[op(Judge::Defense, 2, "x"), op(Judge::TechLead, 3, "y")]);
        assert_eq!(low.result.final_score, 2);
        let high = reduce(&[op(Judge::Defense, 4, "x"), op(Judge::TechLead, 3, "y")]);
        assert_eq!(high.result.final_score, 4);
    }

    #[test]
    fn test_dissent_without_both_roles() {
        let reduction = reduce(&[op(Judge::TechLead, 1, "x"), op(Judge::Defense, 5, "y")]);
        assert_eq!(
            reduction.result.dissent.as_deref(),
            Some("High disagreement between judges. Review evidence grounding.")
        );
        // No prosecutor, so no decrement: mean 3
        assert_eq!(reduction.result.final_score, 3);
    }

    #[test]
    fn test_points_are_capped_and_truncated() {
        let long = "x".repeat(300);
        let opinions: Vec<Opinion> = (0..5).map(|_| op(Judge::Prosecutor, 1, &long)).collect();
        let reduction = reduce(&opinions);
        assert_eq!(reduction.result.weaknesses.len(), 3);
        assert_eq!(
            reduction.result.weaknesses[0].chars().count(),
            "Prosecutor: ".len() + 180
        );
    }

    #[test]
    fn test_truncation_counts_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn test_fact_supremacy_caps_high_scores() {
        let opinions = [
            op(Judge::Prosecutor, 1, "unsafe"),
            op(Judge::Prosecutor, 1, "unsafe again"),
            op(Judge::Defense, 5, "great"),
            op(Judge::TechLead, 2, "meh"),
            op(Judge::TechLead, 5, "great"),
        ];
        let refs: Vec<&Opinion> = opinions.iter().collect();
        let facts = Facts {
            unsafe_execution: true,
            structural_failure: false,
        };
        let reduction = reduce_criterion(
            &criterion("security_sandboxing"),
            &refs,
            &facts,
            &FactSupremacy::default(),
        );
        assert!(reduction.result.final_score <= FACT_CEILING);
        assert_eq!(reduction.result.weaknesses.len(), 3);
        assert_eq!(reduction.result.weaknesses[2], UNSAFE_FACT_REASON);

        let all_fives = [op(Judge::Defense, 5, "a"), op(Judge::TechLead, 5, "b")];
        let refs: Vec<&Opinion> = all_fives.iter().collect();
        let reduction = reduce_criterion(
            &criterion("security_sandboxing"),
            &refs,
            &facts,
            &FactSupremacy::default(),
        );
        assert_eq!(reduction.result.final_score, 2);
    }

    #[test]
    fn test_fact_supremacy_respects_relevance_and_flag() {
        let opinions = [op(Judge::Defense, 5, "a")];
        let refs: Vec<&Opinion> = opinions.iter().collect();
        let facts = Facts {
            unsafe_execution: true,
            structural_failure: true,
        };

        let unrelated =
            reduce_criterion(&criterion("docs"), &refs, &facts, &FactSupremacy::default());
        assert_eq!(unrelated.result.final_score, 5);

        let disabled = reduce_criterion(
            &criterion("security_sandboxing"),
            &refs,
            &facts,
            &FactSupremacy::disabled(),
        );
        assert_eq!(disabled.result.final_score, 5);

        let structural = reduce_criterion(
            &criterion("langgraph_architecture"),
            &refs,
            &facts,
            &FactSupremacy::default(),
        );
        assert_eq!(structural.result.final_score, 2);
        assert_eq!(structural.result.weaknesses, vec![STRUCTURAL_FACT_REASON]);
    }

    #[test]
    fn test_facts_from_evidence_use_precise_markers() {
        use crate::models::{ARCHITECTURE_GOAL, SECURITY_SCAN_GOAL, UNSAFE_EXECUTION_GOAL};
        let evidence = [
            Evidence::new(SECURITY_SCAN_GOAL, false, "repo", "no shell=True found", 0.9),
            Evidence::new("Doc mentions unsafe execution detected", true, "pdf", "x", 0.9),
            Evidence::new(ARCHITECTURE_GOAL, true, "src/graph.py", "ok", 1.0),
        ];
        assert_eq!(Facts::from_evidence(&evidence), Facts::default());

        let evidence = [
            Evidence::new(UNSAFE_EXECUTION_GOAL, true, "a.py", "x", 0.9),
            Evidence::new(ARCHITECTURE_GOAL, false, "src/graph.py", "x", 0.65),
        ];
        assert_eq!(
            Facts::from_evidence(&evidence),
            Facts {
                unsafe_execution: true,
                structural_failure: true
            }
        );
    }
}
