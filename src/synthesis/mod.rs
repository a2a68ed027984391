//! Audit synthesis
//!
//! Reduces judge opinions per rubric criterion and assembles the final
//! [`AuditReport`]. Criteria are reduced in parallel, then folded into an
//! accumulator in rubric order, so the report never depends on which
//! reduction finished first.
//!
//! Synthesis only reads its inputs.

mod citations;
mod reducer;

pub use citations::{find_dangling_citations, DanglingCitation};
pub use reducer::{
    reduce_criterion, CriterionReduction, Facts, DISSENT_SPREAD, FACT_CEILING,
    STRUCTURAL_FACT_REASON, UNSAFE_FACT_REASON,
};

use crate::models::{clamp_score, AuditReport, CriterionResult, EvidenceMap, Opinion, MIN_SCORE};
use crate::rubric::Rubric;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Longest `key_risks` / `next_steps` list in a report
pub const MAX_REPORT_ITEMS: usize = 8;

pub const SECURITY_RISK: &str = "Security red flag detected (unsafe system execution).";
pub const SECURITY_STEP: &str =
    "Fix unsafe execution: remove os.system / shell=True, use safe subprocess calls.";

const GENERIC_NEXT_STEPS: [&str; 2] = [
    "Review dissent areas (if any) and tighten evidence grounding.",
    "Add missing rubric coverage if any criterion has score=1.",
];

/// Report lists built up one criterion at a time
#[derive(Debug, Default)]
struct Accumulator {
    criteria: Vec<CriterionResult>,
    key_risks: Vec<String>,
    next_steps: Vec<String>,
}

impl Accumulator {
    fn absorb(mut self, reduction: CriterionReduction) -> Self {
        self.criteria.push(reduction.result);
        self.key_risks.extend(reduction.risks);
        self.next_steps.extend(reduction.next_steps);
        self
    }
}

/// Keep first occurrences, in order, up to `limit` items.
pub fn dedup_capped(items: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .take(limit)
        .collect()
}

/// Weighted mean over positively weighted criteria, or the plain mean when
/// no criterion carries weight. Rounded half to even and clamped.
pub fn overall_score(criteria: &[CriterionResult], rubric: &Rubric) -> u8 {
    let weighted: Vec<(f64, f64)> = criteria
        .iter()
        .filter_map(|result| {
            let weight = rubric.criterion(&result.criterion_id)?.weight;
            (weight > 0.0).then_some((result.final_score as f64, weight))
        })
        .collect();

    let mean = if weighted.is_empty() {
        if criteria.is_empty() {
            return MIN_SCORE;
        }
        criteria.iter().map(|r| r.final_score as f64).sum::<f64>() / criteria.len() as f64
    } else {
        // Weights are relative; scaling by the largest keeps both sums finite.
        let max_weight = weighted.iter().map(|(_, w)| *w).fold(0.0, f64::max);
        let total_weight: f64 = weighted.iter().map(|(_, w)| w / max_weight).sum();
        weighted
            .iter()
            .map(|(s, w)| s * (w / max_weight))
            .sum::<f64>()
            / total_weight
    };

    clamp_score(mean.round_ties_even() as i64)
}

/// Build the audit report for `rubric` from evidence and opinions.
pub fn synthesize(evidence: &EvidenceMap, opinions: &[Opinion], rubric: &Rubric) -> AuditReport {
    let mut grouped: HashMap<&str, Vec<&Opinion>> = HashMap::new();
    let mut unknown_risks = Vec::new();
    for opinion in opinions {
        if rubric.contains(&opinion.criterion_id) {
            grouped
                .entry(opinion.criterion_id.as_str())
                .or_default()
                .push(opinion);
        } else {
            warn!(
                "Ignoring {} opinion on unknown criterion {}",
                opinion.judge, opinion.criterion_id
            );
            unknown_risks.push(format!(
                "Opinion for unknown criterion {} was ignored.",
                opinion.criterion_id
            ));
        }
    }

    let facts = Facts::from_evidence(evidence.values().flatten());
    debug!("Facts for synthesis: {:?}", facts);
    let fact_rules = &rubric.rules.fact_supremacy;

    let reductions: Vec<CriterionReduction> = rubric
        .criteria()
        .par_iter()
        .map(|criterion| {
            let group = grouped
                .get(criterion.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            reduce_criterion(criterion, group, &facts, fact_rules)
        })
        .collect();

    let mut acc = reductions
        .into_iter()
        .fold(Accumulator::default(), Accumulator::absorb);

    let mut overall = overall_score(&acc.criteria, rubric);

    if facts.unsafe_execution {
        let before = overall;
        overall = rubric.rules.security_override.apply(overall);
        info!("Security override applied: {} -> {}", before, overall);
        acc.key_risks.push(SECURITY_RISK.to_string());
        acc.next_steps.push(SECURITY_STEP.to_string());
    }

    acc.key_risks.extend(unknown_risks);
    for dangling in find_dangling_citations(evidence, opinions) {
        warn!("{}", dangling);
        acc.key_risks.push(dangling.to_string());
    }

    let key_risks = dedup_capped(acc.key_risks, MAX_REPORT_ITEMS);
    let mut next_steps = dedup_capped(acc.next_steps, MAX_REPORT_ITEMS);
    if next_steps.is_empty() {
        next_steps = GENERIC_NEXT_STEPS.iter().map(|s| s.to_string()).collect();
    }

    let executive_summary = format!(
        "Final audit complete. Overall score={}/5. Criteria evaluated={}. Judicial opinions received={}.",
        overall,
        acc.criteria.len(),
        opinions.len()
    );

    info!(
        "Synthesized {} criteria from {} opinions: overall {}/5",
        acc.criteria.len(),
        opinions.len(),
        overall
    );

    AuditReport {
        overall_score: overall,
        executive_summary,
        criteria: acc.criteria,
        key_risks,
        next_steps,
    }
}
