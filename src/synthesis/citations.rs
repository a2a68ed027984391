//! Citation integrity checks

use crate::models::{resolve_evidence, EvidenceId, EvidenceMap, Judge, Opinion};
use std::fmt;

/// A cited evidence id that does not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingCitation {
    pub judge: Judge,
    pub criterion_id: String,
    pub citation: String,
}

impl fmt::Display for DanglingCitation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unresolved evidence citation {} from {} on {}.",
            self.citation, self.judge, self.criterion_id
        )
    }
}

/// Every citation, in opinion order, that is malformed or points past the
/// evidence filed under its source.
pub fn find_dangling_citations(evidence: &EvidenceMap, opinions: &[Opinion]) -> Vec<DanglingCitation> {
    opinions
        .iter()
        .flat_map(|opinion| {
            opinion
                .cited_evidence
                .iter()
                .filter(|citation| {
                    citation
                        .parse::<EvidenceId>()
                        .map_or(true, |id| resolve_evidence(evidence, &id).is_none())
                })
                .map(move |citation| DanglingCitation {
                    judge: opinion.judge,
                    criterion_id: opinion.criterion_id.clone(),
                    citation: citation.clone(),
                })
        })
        .collect()
}
