//! Fixed-width console table.
//!
//! ```text
//! Test: support-answer
//! ------------------------------------------------------------------------
//! ✓ max_length                        1.00 structural
//! ✗ toxicity                          0.20 guardrail   Toxicity 0.80 at or above threshold 0.50
//! ------------------------------------------------------------------------
//! Overall: FAIL | Score: 0.60 | 1/2 passed
//! ```

use crate::types::EvaluationReport;

const RULE_WIDTH: usize = 72;
const NAME_WIDTH: usize = 32;
const CATEGORY_WIDTH: usize = 12;

const PASS_MARKER: &str = "✓";
const FAIL_MARKER: &str = "✗";

/// Truncate to `width` characters, marking the cut with `...`.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Render a report as a table followed by the summary line.
pub fn render(report: &EvaluationReport) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut lines = Vec::with_capacity(report.results.len() + 4);

    lines.push(format!("Test: {}", report.test_name));
    lines.push(rule.clone());

    for result in &report.results {
        let marker = if result.pass { PASS_MARKER } else { FAIL_MARKER };
        let mut row = format!(
            "{} {:<name_w$} {:>5.2} {:<cat_w$}",
            marker,
            fit(&result.name, NAME_WIDTH),
            result.score,
            result.category.as_str(),
            name_w = NAME_WIDTH,
            cat_w = CATEGORY_WIDTH,
        );
        if !result.pass {
            row.push_str(&result.details);
        }
        lines.push(row.trim_end().to_string());
    }

    lines.push(rule);
    lines.push(summary_line(report));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// `Overall: PASS|FAIL | Score: <mean> | <passed>/<total> passed`
pub fn summary_line(report: &EvaluationReport) -> String {
    format!(
        "Overall: {} | Score: {:.2} | {}/{} passed",
        if report.overall_pass { "PASS" } else { "FAIL" },
        report.overall_score,
        report.summary.passed,
        report.summary.total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::types::{Category, EvaluationResult, Severity};

    fn sample_report() -> EvaluationReport {
        Aggregator::new().aggregate(
            "support-answer",
            vec![
                EvaluationResult::new("max_length", Category::Structural, Severity::Error)
                    .with_outcome(true, 1.0)
                    .with_details("Length 20 is within limit 100"),
                EvaluationResult::new("toxicity", Category::Guardrail, Severity::Error)
                    .with_outcome(false, 0.2)
                    .with_details("Toxicity 0.80 at or above threshold 0.50"),
            ],
        )
    }

    #[test]
    fn test_render_exact() {
        let rule = "-".repeat(72);
        let expected = [
            "Test: support-answer",
            rule.as_str(),
            "✓ max_length                        1.00 structural",
            "✗ toxicity                          0.20 guardrail   Toxicity 0.80 at or above threshold 0.50",
            rule.as_str(),
            "Overall: FAIL | Score: 0.60 | 1/2 passed",
        ]
        .join("\n")
            + "\n";

        assert_eq!(render(&sample_report()), expected);
    }

    #[test]
    fn test_summary_line_for_empty_report() {
        let report = Aggregator::new().aggregate("empty", vec![]);
        assert_eq!(summary_line(&report), "Overall: PASS | Score: 0.00 | 0/0 passed");
    }

    #[test]
    fn test_long_names_are_truncated() {
        assert_eq!(fit("short", 32), "short");
        let long = "x".repeat(40);
        let fitted = fit(&long, 32);
        assert_eq!(fitted.chars().count(), 32);
        assert!(fitted.ends_with("..."));
    }
}
