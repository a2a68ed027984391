//! Judge personas, prompt construction and reply parsing

use super::{EvidenceDigest, ProviderError};
use crate::models::{Judge, Opinion};
use crate::rubric::RubricCriterion;
use serde::Deserialize;

pub fn persona(judge: Judge) -> &'static str {
    match judge {
        Judge::Prosecutor => {
            "You are the Prosecutor. Be skeptical and strict. \
             Assume corners were cut unless evidence proves otherwise. \
             Penalize missing requirements, security issues, and vague claims."
        }
        Judge::Defense => {
            "You are the Defense. Be fair and generous. \
             Give credit for partial implementations and clear intent. \
             If evidence is incomplete, suggest what would complete it."
        }
        Judge::TechLead => {
            "You are the Tech Lead. Be practical and engineering-focused. \
             Prioritize correctness, maintainability, and system design. \
             Reward clean architecture and strong evidence."
        }
    }
}

const SCORING_RULES: &str = "Score from 1 to 5:
1 = fails/no evidence
2 = weak / major gaps
3 = acceptable / partial
4 = strong
5 = excellent / exemplary

Rules:
- Use ONLY the evidence provided.
- Do NOT invent files or facts.
- cited_evidence must be IDs like repo_detective:0 or doc_detective:2 (NO brackets).
- Return ONLY JSON. No markdown, no code fences, no extra text.";

pub fn build_prompt(judge: Judge, criterion: &RubricCriterion, digest: &EvidenceDigest) -> String {
    let mut prompt = String::new();
    prompt.push_str(persona(judge));
    prompt.push_str("\n\nCriterion:\n");
    prompt.push_str(&format!("- id: {}\n", criterion.id));
    prompt.push_str(&format!("- name: {}\n", criterion.display_name()));
    if !criterion.description.trim().is_empty() {
        prompt.push_str(&format!("- description: {}\n", criterion.description.trim()));
    }
    if !criterion.forensic_instruction.trim().is_empty() {
        prompt.push_str(&format!(
            "- forensic instruction: {}\n",
            criterion.forensic_instruction.trim()
        ));
    }
    if let Some(guidance) = criterion.guidance_for(judge.as_str()) {
        prompt.push_str(&format!("- guidance for {}: {}\n", judge, guidance.trim()));
    }

    prompt.push_str("\nEvidence (subset):\n");
    prompt.push_str(&digest.render());
    prompt.push_str("\n\n");
    prompt.push_str(SCORING_RULES);
    prompt.push_str("\n\nReturn ONLY a valid JSON object (no extra text):\n");
    prompt.push_str(&format!(
        r#"{{"judge":"{}","criterion_id":"{}","score":1,"argument":"...","cited_evidence":["repo_detective:0"]}}"#,
        judge, criterion.id
    ));
    prompt
}

/// The outermost `{...}` span in free text.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[derive(Deserialize)]
struct RawOpinion {
    score: f64,
    #[serde(default)]
    argument: String,
    #[serde(default)]
    cited_evidence: Vec<serde_json::Value>,
}

/// Parse a judge reply into an opinion for `(judge, criterion_id)`.
///
/// Judge and criterion in the reply are ignored; the opinion always belongs
/// to the pair that was asked.
pub fn parse_opinion_response(
    text: &str,
    judge: Judge,
    criterion_id: &str,
) -> Result<Opinion, ProviderError> {
    let json = extract_json(text)
        .ok_or_else(|| ProviderError::InvalidResponse("no JSON object in reply".to_string()))?;
    let raw: RawOpinion = serde_json::from_str(json)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
    if !raw.score.is_finite() {
        return Err(ProviderError::InvalidResponse(format!(
            "score {} is not a number",
            raw.score
        )));
    }

    let citations: Vec<String> = raw
        .cited_evidence
        .iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    Ok(
        Opinion::new(judge, criterion_id, raw.score.round() as i64, raw.argument.trim())
            .with_citations(citations),
    )
}
