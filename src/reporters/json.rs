//! JSON reporter
//!
//! Pretty-printed JSON with the same field names as the data model.

use anyhow::Result;
use serde::Serialize;

/// Render any report value as JSON
pub fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forensics::ForensicsResult;
    use crate::models::AuditReport;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_audit_json_round_trips() {
        let report = test_report();
        let json_str = render(&report).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["overall_score"], 3);
        assert_eq!(parsed["criteria"][1]["criterion_id"], "security_sandboxing");
        assert!(parsed["criteria"][0]["dissent"].is_null());

        let back: AuditReport = serde_json::from_str(&json_str).expect("deserialize report");
        assert_eq!(back, report);
    }

    #[test]
    fn test_verification_json_fields() {
        let result = ForensicsResult {
            reason: "Missing src/graph.py".into(),
            file_audited: "src/graph.py".into(),
            ..Default::default()
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&render(&result).expect("render JSON")).expect("parse JSON");
        assert_eq!(parsed["verified"], false);
        assert_eq!(parsed["file_audited"], "src/graph.py");
        assert!(parsed["unsafe_files"].as_array().expect("array").is_empty());
    }
}
