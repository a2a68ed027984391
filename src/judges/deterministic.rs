//! Rule-based judges that need no external service

use super::{EvidenceDigest, OpinionProvider, ProviderError};
use crate::models::{Judge, Opinion};
use crate::rubric::RubricCriterion;

/// Scores from evidence counts alone.
///
/// Base score 3; 1 when there is no evidence at all; 2 for the Prosecutor
/// when anything failed; 4 for the Defense when nothing failed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicJudge;

impl DeterministicJudge {
    pub fn score(judge: Judge, digest: &EvidenceDigest) -> i64 {
        if digest.total == 0 {
            1
        } else if digest.has_failures && judge == Judge::Prosecutor {
            2
        } else if !digest.has_failures && judge == Judge::Defense {
            4
        } else {
            3
        }
    }
}

impl OpinionProvider for DeterministicJudge {
    fn name(&self) -> &str {
        "deterministic"
    }

    fn produce_opinion(
        &self,
        judge: Judge,
        criterion: &RubricCriterion,
        digest: &EvidenceDigest,
    ) -> Result<Opinion, ProviderError> {
        let argument = format!(
            "(Fallback) Evidence_count={}, has_failures={}. Deterministic judge used; configure a judge command for real evaluation.",
            digest.total, digest.has_failures
        );
        Ok(
            Opinion::new(judge, criterion.id.as_str(), Self::score(judge, digest), argument)
                .with_citations(&digest.default_citations),
        )
    }
}
