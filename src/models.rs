//! Core data models for Tribunal
//!
//! Evidence and opinions flow into synthesis; criterion results and the
//! audit report flow out. Field names are part of the machine-readable
//! report format and must not be renamed.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Goal of the structural (architecture) evidence produced by the verifier.
pub const ARCHITECTURE_GOAL: &str = "Repo Forensics: graph fan-out/fan-in + typed state reducers";
/// Goal of the security evidence when an unsafe execution call was found.
pub const UNSAFE_EXECUTION_GOAL: &str = "Security Scan: Unsafe Execution Detected";
/// Goal of the security evidence when the scan came back clean.
pub const SECURITY_SCAN_GOAL: &str = "Security Scan: Unsafe System Calls";
/// Goal of the version-control history evidence.
pub const HISTORY_GOAL: &str = "Repo Forensics: commit history";

/// Lowest score a judge or the synthesizer can hand out.
pub const MIN_SCORE: u8 = 1;
/// Highest score a judge or the synthesizer can hand out.
pub const MAX_SCORE: u8 = 5;

/// Clamp an arbitrary integer score into `[MIN_SCORE, MAX_SCORE]`.
pub fn clamp_score(score: i64) -> u8 {
    score.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u8
}

/// Evidence grouped by the source that produced it.
///
/// Order inside each source matters: it defines the `source:index` ids.
pub type EvidenceMap = BTreeMap<String, Vec<Evidence>>;

/// A single piece of forensic evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub goal: String,
    pub found: bool,
    #[serde(default)]
    pub content: Option<String>,
    pub location: String,
    pub rationale: String,
    /// Confidence score from 0.0 to 1.0
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: f64,
}

impl Evidence {
    pub fn new(
        goal: impl Into<String>,
        found: bool,
        location: impl Into<String>,
        rationale: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            goal: goal.into(),
            found,
            content: None,
            location: location.into(),
            rationale: rationale.into(),
            confidence: clamp_confidence(confidence),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// True only for the verifier's dedicated "unsafe execution detected" record.
    pub fn is_unsafe_execution_finding(&self) -> bool {
        self.found && self.goal == UNSAFE_EXECUTION_GOAL
    }

    /// True only for a failed architecture verification record.
    pub fn is_structural_failure(&self) -> bool {
        !self.found && self.goal == ARCHITECTURE_GOAL
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

fn deserialize_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_confidence)
}

/// Identifier of one evidence item: `source:index`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EvidenceId {
    pub source: String,
    pub index: usize,
}

impl EvidenceId {
    pub fn new(source: impl Into<String>, index: usize) -> Self {
        Self {
            source: source.into(),
            index,
        }
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.index)
    }
}

impl FromStr for EvidenceId {
    type Err = String;

    /// Accepts `repo_detective:0` as well as the bracketed `[repo_detective:0]`
    /// form judges tend to produce.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = normalize_citation(s);
        let (source, index) = cleaned
            .rsplit_once(':')
            .ok_or_else(|| format!("'{}' is not a source:index evidence id", s))?;
        if source.is_empty() {
            return Err(format!("'{}' has an empty source", s));
        }
        let index = index
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("'{}' has a non-numeric index", s))?;
        Ok(Self::new(source.trim(), index))
    }
}

/// Strip brackets and surrounding whitespace from a cited evidence id.
pub fn normalize_citation(raw: &str) -> String {
    raw.trim().replace(['[', ']'], "").trim().to_string()
}

/// Flatten an evidence map into `(id, evidence)` pairs in citation order.
pub fn flatten_evidence(evidence: &EvidenceMap) -> Vec<(EvidenceId, &Evidence)> {
    evidence
        .iter()
        .flat_map(|(source, items)| {
            items
                .iter()
                .enumerate()
                .map(move |(i, ev)| (EvidenceId::new(source.clone(), i), ev))
        })
        .collect()
}

/// Look up an evidence item by id.
pub fn resolve_evidence<'a>(evidence: &'a EvidenceMap, id: &EvidenceId) -> Option<&'a Evidence> {
    evidence.get(&id.source).and_then(|items| items.get(id.index))
}

/// Merge two evidence maps.
///
/// Sources present on only one side are kept as-is. When both sides carry
/// the same source, the left items come first followed by the right items,
/// so existing `source:index` ids on the left stay valid.
pub fn merge_evidence(left: EvidenceMap, right: EvidenceMap) -> EvidenceMap {
    let mut merged = left;
    for (source, items) in right {
        merged.entry(source).or_default().extend(items);
    }
    merged
}

/// Concatenate two opinion sequences, preserving order on both sides.
pub fn append_opinions(left: Vec<Opinion>, right: Vec<Opinion>) -> Vec<Opinion> {
    let mut merged = left;
    merged.extend(right);
    merged
}

/// The three judicial roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Judge {
    #[serde(alias = "prosecutor")]
    Prosecutor,
    #[serde(alias = "defense")]
    Defense,
    #[serde(alias = "techlead", alias = "tech_lead")]
    TechLead,
}

impl Judge {
    pub const ALL: [Judge; 3] = [Judge::Prosecutor, Judge::Defense, Judge::TechLead];

    pub fn as_str(&self) -> &'static str {
        match self {
            Judge::Prosecutor => "Prosecutor",
            Judge::Defense => "Defense",
            Judge::TechLead => "TechLead",
        }
    }
}

impl fmt::Display for Judge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Judge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "").as_str() {
            "prosecutor" => Ok(Judge::Prosecutor),
            "defense" => Ok(Judge::Defense),
            "techlead" => Ok(Judge::TechLead),
            _ => Err(format!(
                "Unknown judge '{}'. Valid judges: Prosecutor, Defense, TechLead",
                s
            )),
        }
    }
}

/// One judge's scored opinion on one rubric criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub judge: Judge,
    pub criterion_id: String,
    /// Always within `[1, 5]`
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    #[serde(default)]
    pub argument: String,
    #[serde(default)]
    pub cited_evidence: BTreeSet<String>,
}

impl Opinion {
    pub fn new(
        judge: Judge,
        criterion_id: impl Into<String>,
        score: i64,
        argument: impl Into<String>,
    ) -> Self {
        Self {
            judge,
            criterion_id: criterion_id.into(),
            score: clamp_score(score),
            argument: argument.into(),
            cited_evidence: BTreeSet::new(),
        }
    }

    pub fn with_citations<I, S>(mut self, citations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cited_evidence = citations
            .into_iter()
            .map(|c| normalize_citation(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();
        self
    }
}

fn deserialize_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if raw.is_nan() {
        return Ok(MIN_SCORE);
    }
    Ok(clamp_score(raw.round() as i64))
}

/// Synthesized verdict for one rubric criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion_id: String,
    pub final_score: u8,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub remediation: Vec<String>,
    #[serde(default)]
    pub dissent: Option<String>,
}

/// Terminal artifact of an audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub overall_score: u8,
    pub executive_summary: String,
    pub criteria: Vec<CriterionResult>,
    #[serde(default)]
    pub key_risks: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}
