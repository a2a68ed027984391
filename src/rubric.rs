//! Rubric definition and synthesis rules
//!
//! The rubric is loaded once from JSON and is read-only for the whole run.
//!
//! ```json
//! {
//!   "dimensions": [
//!     {
//!       "id": "langgraph_architecture",
//!       "name": "Graph Orchestration Architecture",
//!       "weight": 2,
//!       "forensic_instruction": "Check src/graph.py for fan-out from START.",
//!       "judicial_logic": { "prosecutor": "Linear pipelines score 1." }
//!     }
//!   ],
//!   "synthesis_rules": {
//!     "security_override": "Confirmed security flaws cap the total score at 3",
//!     "fact_supremacy": "Forensic evidence always overrules judicial opinion"
//!   }
//! }
//! ```
//!
//! `criteria` is accepted as an alias for `dimensions`.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Criteria that an unsafe-execution finding caps by default.
pub const DEFAULT_UNSAFE_EXECUTION_CRITERIA: &[&str] =
    &["security_sandboxing", "forensic_accuracy_code"];

/// Criteria that a structural verification failure caps by default.
pub const DEFAULT_STRUCTURAL_FAILURE_CRITERIA: &[&str] =
    &["langgraph_architecture", "forensic_accuracy_code"];

/// Errors that make a rubric unusable. These are fatal for synthesis.
#[derive(Error, Debug)]
pub enum RubricError {
    #[error("Rubric file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read rubric {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rubric JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rubric contains no criteria")]
    Empty,

    #[error("Rubric criterion #{0} has an empty id")]
    MissingId(usize),

    #[error("Rubric criterion '{0}' is defined more than once")]
    DuplicateCriterion(String),

    #[error("Rubric criterion '{id}' has invalid weight {weight} (must be >= 0)")]
    InvalidWeight { id: String, weight: f64 },
}

/// One rubric criterion (a.k.a. dimension)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Relative weight; 0 means unweighted
    #[serde(default, deserialize_with = "deserialize_weight")]
    pub weight: f64,
    #[serde(default)]
    pub forensic_instruction: String,
    /// Per-judge guidance, keyed by judge name as written in the rubric
    #[serde(default)]
    pub judicial_logic: BTreeMap<String, String>,
    #[serde(default)]
    pub description: String,
}

impl RubricCriterion {
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            weight,
            forensic_instruction: String::new(),
            judicial_logic: BTreeMap::new(),
            description: String::new(),
        }
    }

    /// Guidance for a judge, matching the rubric key case-insensitively.
    pub fn guidance_for(&self, judge: &str) -> Option<&str> {
        let wanted = judge.to_lowercase().replace('_', "");
        self.judicial_logic
            .iter()
            .find(|(k, _)| k.to_lowercase().replace('_', "") == wanted)
            .map(|(_, v)| v.as_str())
    }

    /// Name for display, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

fn deserialize_weight<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// What happens to the overall score when unsafe execution is confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "RawSecurityOverride")]
pub enum SecurityOverride {
    /// Cap the overall score at a ceiling
    Cap { ceiling: u8 },
    /// Lower the overall score by one (never below 1)
    #[default]
    Decrement,
}

impl SecurityOverride {
    pub fn apply(&self, overall: u8) -> u8 {
        match self {
            SecurityOverride::Cap { ceiling } => overall.min(*ceiling).max(crate::models::MIN_SCORE),
            SecurityOverride::Decrement => overall.saturating_sub(1).max(crate::models::MIN_SCORE),
        }
    }

    /// Interpret a free-text rule such as "cap the total score at 3".
    fn from_phrase(phrase: &str) -> Self {
        let lower = phrase.to_lowercase();
        if lower.contains("cap") {
            let digits: String = lower
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if let Ok(n) = digits.parse::<i64>() {
                return SecurityOverride::Cap {
                    ceiling: crate::models::clamp_score(n),
                };
            }
        }
        SecurityOverride::Decrement
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSecurityOverride {
    Null(()),
    Phrase(String),
    Cap { cap: i64 },
}

impl From<RawSecurityOverride> for SecurityOverride {
    fn from(raw: RawSecurityOverride) -> Self {
        match raw {
            RawSecurityOverride::Null(()) => SecurityOverride::default(),
            RawSecurityOverride::Phrase(p) => SecurityOverride::from_phrase(&p),
            RawSecurityOverride::Cap { cap } => SecurityOverride::Cap {
                ceiling: crate::models::clamp_score(cap),
            },
        }
    }
}

/// Fact-supremacy configuration: which criteria static facts may cap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFactSupremacy")]
pub struct FactSupremacy {
    pub enabled: bool,
    pub unsafe_execution_criteria: Vec<String>,
    pub structural_failure_criteria: Vec<String>,
}

impl Default for FactSupremacy {
    fn default() -> Self {
        Self {
            enabled: true,
            unsafe_execution_criteria: to_owned_list(DEFAULT_UNSAFE_EXECUTION_CRITERIA),
            structural_failure_criteria: to_owned_list(DEFAULT_STRUCTURAL_FAILURE_CRITERIA),
        }
    }
}

impl FactSupremacy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn caps_on_unsafe_execution(&self, criterion_id: &str) -> bool {
        self.enabled && self.unsafe_execution_criteria.iter().any(|c| c == criterion_id)
    }

    pub fn caps_on_structural_failure(&self, criterion_id: &str) -> bool {
        self.enabled && self.structural_failure_criteria.iter().any(|c| c == criterion_id)
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFactSupremacy {
    Null(()),
    Flag(bool),
    Phrase(String),
    Detailed {
        #[serde(default)]
        enabled: Option<bool>,
        #[serde(default)]
        unsafe_execution_criteria: Option<Vec<String>>,
        #[serde(default)]
        structural_failure_criteria: Option<Vec<String>>,
    },
}

impl From<RawFactSupremacy> for FactSupremacy {
    fn from(raw: RawFactSupremacy) -> Self {
        match raw {
            RawFactSupremacy::Null(()) => FactSupremacy::default(),
            RawFactSupremacy::Flag(enabled) => FactSupremacy {
                enabled,
                ..FactSupremacy::default()
            },
            RawFactSupremacy::Phrase(p) => FactSupremacy {
                enabled: !p.trim().is_empty(),
                ..FactSupremacy::default()
            },
            RawFactSupremacy::Detailed {
                enabled,
                unsafe_execution_criteria,
                structural_failure_criteria,
            } => {
                let defaults = FactSupremacy::default();
                FactSupremacy {
                    enabled: enabled.unwrap_or(true),
                    unsafe_execution_criteria: unsafe_execution_criteria
                        .unwrap_or(defaults.unsafe_execution_criteria),
                    structural_failure_criteria: structural_failure_criteria
                        .unwrap_or(defaults.structural_failure_criteria),
                }
            }
        }
    }
}

/// Global synthesis rules from the rubric
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SynthesisRules {
    #[serde(default)]
    pub security_override: SecurityOverride,
    #[serde(default)]
    pub fact_supremacy: FactSupremacy,
}

/// A validated rubric: at least one criterion, unique ids, non-negative weights
#[derive(Debug, Clone, PartialEq)]
pub struct Rubric {
    criteria: Vec<RubricCriterion>,
    pub rules: SynthesisRules,
}

#[derive(Deserialize)]
struct RawRubric {
    #[serde(default)]
    dimensions: Option<Vec<RubricCriterion>>,
    #[serde(default)]
    criteria: Option<Vec<RubricCriterion>>,
    #[serde(default)]
    synthesis_rules: Option<SynthesisRules>,
}

impl Rubric {
    /// Build a rubric, validating the criteria.
    pub fn new(criteria: Vec<RubricCriterion>, rules: SynthesisRules) -> Result<Self, RubricError> {
        if criteria.is_empty() {
            return Err(RubricError::Empty);
        }

        let mut seen = HashSet::new();
        for (i, c) in criteria.iter().enumerate() {
            if c.id.trim().is_empty() {
                return Err(RubricError::MissingId(i));
            }
            if !seen.insert(c.id.as_str()) {
                return Err(RubricError::DuplicateCriterion(c.id.clone()));
            }
            if !(c.weight >= 0.0) || !c.weight.is_finite() {
                return Err(RubricError::InvalidWeight {
                    id: c.id.clone(),
                    weight: c.weight,
                });
            }
        }

        Ok(Self { criteria, rules })
    }

    /// Parse a rubric from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, RubricError> {
        let raw: RawRubric = serde_json::from_str(json)?;
        let criteria = raw.dimensions.or(raw.criteria).unwrap_or_default();
        Self::new(criteria, raw.synthesis_rules.unwrap_or_default())
    }

    /// Criteria in rubric-definition order
    pub fn criteria(&self) -> &[RubricCriterion] {
        &self.criteria
    }

    pub fn criterion(&self, id: &str) -> Option<&RubricCriterion> {
        self.criteria.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.criterion(id).is_some()
    }
}

/// Load and validate a rubric file.
pub fn load_rubric(path: &Path) -> Result<Rubric, RubricError> {
    if !path.exists() {
        return Err(RubricError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| RubricError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rubric = Rubric::from_json_str(&content)?;
    debug!(
        "Loaded rubric from {} ({} criteria, override {:?})",
        path.display(),
        rubric.criteria().len(),
        rubric.rules.security_override
    );
    Ok(rubric)
}
