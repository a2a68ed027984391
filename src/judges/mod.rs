//! Judicial opinions
//!
//! An [`OpinionProvider`] scores one rubric criterion from one judge's
//! perspective. [`collect_opinions`] asks it for every (judge, criterion)
//! pair and guarantees a well-formed opinion for each, substituting a
//! placeholder when the provider fails.
//!
//! Providers:
//! - [`DeterministicJudge`] - rule-based, no external calls
//! - [`CommandJudge`] - external program, prompt on stdin, JSON on stdout

mod command;
mod deterministic;
mod digest;
pub mod prompts;

pub use command::{run_command, CommandJudge, CommandOutput};
pub use deterministic::DeterministicJudge;
pub use digest::{choose_citations, EvidenceDigest};

use crate::config::JudgeSettings;
use crate::models::{EvidenceMap, Judge, Opinion};
use crate::rubric::{Rubric, RubricCriterion};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

/// Score given to placeholder opinions
pub const FALLBACK_SCORE: i64 = 2;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to launch judge: {0}")]
    Launch(String),

    #[error("{program} timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },

    #[error("judge exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("invalid judge reply: {0}")]
    InvalidResponse(String),
}

/// Produces one opinion per (judge, criterion) request
pub trait OpinionProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    fn produce_opinion(
        &self,
        judge: Judge,
        criterion: &RubricCriterion,
        digest: &EvidenceDigest,
    ) -> Result<Opinion, ProviderError>;
}

/// The provider configured by `settings`: an external command when one is
/// set, deterministic judges otherwise.
pub fn provider_from_settings(settings: &JudgeSettings) -> Box<dyn OpinionProvider> {
    if settings.command.is_empty() {
        Box::new(DeterministicJudge)
    } else {
        Box::new(
            CommandJudge::new(settings.command.clone(), settings.timeout_secs)
                .with_retries(settings.retries),
        )
    }
}

/// Placeholder for a failed provider call.
pub fn fallback_opinion(
    judge: Judge,
    criterion_id: &str,
    error: &ProviderError,
    digest: &EvidenceDigest,
) -> Opinion {
    Opinion::new(
        judge,
        criterion_id,
        FALLBACK_SCORE,
        format!("Judge call failed; safe fallback used. Error: {}", error),
    )
    .with_citations(&digest.default_citations)
}

/// Ask `provider` for every judge on every criterion.
///
/// Output order is judge-major (all Prosecutor opinions in rubric order,
/// then Defense, then TechLead) regardless of completion order.
pub fn collect_opinions(
    provider: &dyn OpinionProvider,
    rubric: &Rubric,
    evidence: &EvidenceMap,
    settings: &JudgeSettings,
) -> Vec<Opinion> {
    let digest = EvidenceDigest::new(evidence, settings.max_evidence, settings.citation_limit);
    let requests: Vec<(Judge, &RubricCriterion)> = Judge::ALL
        .iter()
        .flat_map(|&judge| rubric.criteria().iter().map(move |c| (judge, c)))
        .collect();

    info!(
        "Collecting {} opinions from {} judge provider",
        requests.len(),
        provider.name()
    );

    requests
        .par_iter()
        .map(|&(judge, criterion)| ask(provider, judge, criterion, &digest))
        .collect()
}

fn ask(
    provider: &dyn OpinionProvider,
    judge: Judge,
    criterion: &RubricCriterion,
    digest: &EvidenceDigest,
) -> Opinion {
    let mut opinion = match provider.produce_opinion(judge, criterion, digest) {
        Ok(opinion) => opinion,
        Err(e) => {
            warn!("{} on {}: {}; using fallback opinion", judge, criterion.id, e);
            return fallback_opinion(judge, &criterion.id, &e, digest);
        }
    };

    if opinion.judge != judge || opinion.criterion_id != criterion.id {
        warn!(
            "Provider answered as {} on {}; filing under {} on {}",
            opinion.judge, opinion.criterion_id, judge, criterion.id
        );
        opinion.judge = judge;
        opinion.criterion_id = criterion.id.clone();
    }
    if opinion.cited_evidence.is_empty() {
        opinion = opinion.with_citations(&digest.default_citations);
    }
    opinion
}
