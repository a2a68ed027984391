//! Compact evidence summary handed to judges

use crate::models::{flatten_evidence, Evidence, EvidenceId, EvidenceMap};
use std::cmp::Ordering;

/// What a judge sees of the evidence
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceDigest {
    /// One `- id | FOUND/FAIL | goal | location | confidence` line per item
    pub lines: Vec<String>,
    /// Citations attached when a judge cites nothing
    pub default_citations: Vec<String>,
    /// Evidence items in total (not just the ones listed)
    pub total: usize,
    pub has_failures: bool,
}

impl EvidenceDigest {
    pub fn new(evidence: &EvidenceMap, max_items: usize, citation_limit: usize) -> Self {
        let flat = flatten_evidence(evidence);
        let lines = flat
            .iter()
            .take(max_items)
            .map(|(id, ev)| {
                format!(
                    "- {} | {} | {} | {} | {:.2}",
                    id,
                    if ev.found { "FOUND" } else { "FAIL" },
                    ev.goal,
                    ev.location,
                    ev.confidence
                )
            })
            .collect();

        Self {
            lines,
            default_citations: choose_citations(&flat, citation_limit),
            total: flat.len(),
            has_failures: flat.iter().any(|(_, ev)| !ev.found),
        }
    }

    /// The digest as prompt text.
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            "No evidence provided.".to_string()
        } else {
            self.lines.join("\n")
        }
    }
}

fn by_confidence_desc(a: &(EvidenceId, &Evidence), b: &(EvidenceId, &Evidence)) -> Ordering {
    b.1.confidence
        .partial_cmp(&a.1.confidence)
        .unwrap_or(Ordering::Equal)
}

/// Pick up to `limit` ids: failed evidence first, then found evidence, each
/// by descending confidence. Ties keep evidence order.
pub fn choose_citations(flat: &[(EvidenceId, &Evidence)], limit: usize) -> Vec<String> {
    let (mut failed, mut found): (Vec<_>, Vec<_>) =
        flat.iter().cloned().partition(|(_, ev)| !ev.found);
    failed.sort_by(by_confidence_desc);
    found.sort_by(by_confidence_desc);

    failed
        .into_iter()
        .chain(found)
        .take(limit)
        .map(|(id, _)| id.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(found: bool, confidence: f64) -> Evidence {
        Evidence::new("goal", found, "loc", "why", confidence)
    }

    fn sample() -> EvidenceMap {
        EvidenceMap::from([
            (
                "repo_detective".to_string(),
                vec![ev(true, 1.0), ev(false, 0.9), ev(true, 0.5)],
            ),
            (
                "doc_detective".to_string(),
                vec![ev(false, 0.4), ev(true, 0.95)],
            ),
        ])
    }

    #[test]
    fn test_citations_prefer_failures_then_confidence() {
        let evidence = sample();
        let flat = flatten_evidence(&evidence);
        assert_eq!(
            choose_citations(&flat, 3),
            vec!["repo_detective:1", "doc_detective:0", "repo_detective:0"]
        );
        assert_eq!(choose_citations(&flat, 0), Vec::<String>::new());
        assert_eq!(choose_citations(&flat, 10).len(), 5);
    }

    #[test]
    fn test_digest_lines() {
        let digest = EvidenceDigest::new(&sample(), 2, 3);
        assert_eq!(digest.total, 5);
        assert!(digest.has_failures);
        assert_eq!(digest.lines.len(), 2);
        assert_eq!(digest.lines[0], "- doc_detective:0 | FAIL | goal | loc | 0.40");
    }

    #[test]
    fn test_empty_digest() {
        let digest = EvidenceDigest::new(&EvidenceMap::new(), 6, 3);
        assert_eq!(digest.total, 0);
        assert!(!digest.has_failures);
        assert!(digest.default_citations.is_empty());
        assert_eq!(digest.render(), "No evidence provided.");
    }
}
