//! JSON export.
//!
//! The report is serialized verbatim with stable camelCase field names and an
//! RFC 3339 timestamp.

use crate::types::EvaluationReport;

pub fn to_json(report: &EvaluationReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

pub fn to_json_pretty(report: &EvaluationReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Read back a report written by [`to_json`].
pub fn from_json(json: &str) -> Result<EvaluationReport, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::types::{Category, EvaluationResult, Severity};
    use serde_json::Value;

    fn sample_report() -> EvaluationReport {
        Aggregator::new().aggregate(
            "json-export",
            vec![
                EvaluationResult::new("no_personal_data", Category::Guardrail, Severity::Error)
                    .with_outcome(false, 0.0)
                    .with_threshold(1.0)
                    .with_details("Personal data detected: email (1)"),
                EvaluationResult::new("on_topic", Category::Guardrail, Severity::Warning)
                    .with_outcome(true, 0.5)
                    .with_threshold(0.3),
            ],
        )
    }

    #[test]
    fn test_stable_field_names() {
        let value: Value = serde_json::from_str(&to_json(&sample_report()).unwrap()).unwrap();

        for key in ["testName", "timestamp", "overallPass", "overallScore", "results", "summary"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["testName"], "json-export");
        assert_eq!(value["overallPass"], false);
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["summary"]["bySeverity"]["error"], 1);
        assert_eq!(value["results"][1]["severity"], "warning");
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_report_reads_back() {
        let report = sample_report();
        let restored = from_json(&to_json_pretty(&report).unwrap()).unwrap();
        assert_eq!(restored, report);
    }
}
