//! Aggregator: reduces evaluator results into one report.
//!
//! The aggregator applies strict, non-configurable rules:
//! 1. `overall_score` is the arithmetic mean of result scores (0 when empty)
//! 2. `overall_pass` is false iff some error-severity result failed
//! 3. Warning and info failures are counted but never flip the verdict
//!
//! Results are kept exactly as produced, in invocation order.

use chrono::Utc;

use crate::types::{EvaluationReport, EvaluationResult, ReportSummary};

/// The Aggregator turns a result list into an [`EvaluationReport`].
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Build a report stamped with the current time.
    pub fn aggregate(
        &self,
        test_name: impl Into<String>,
        results: Vec<EvaluationResult>,
    ) -> EvaluationReport {
        let summary = self.summarize(&results);
        let overall_score = self.mean_score(&results);
        let overall_pass = !results.iter().any(EvaluationResult::is_blocking_failure);

        EvaluationReport {
            test_name: test_name.into(),
            timestamp: Utc::now(),
            overall_pass,
            overall_score,
            results,
            summary,
        }
    }

    fn mean_score(&self, results: &[EvaluationResult]) -> f64 {
        if results.is_empty() {
            return 0.0;
        }
        results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
    }

    fn summarize(&self, results: &[EvaluationResult]) -> ReportSummary {
        let mut summary = ReportSummary {
            total: results.len(),
            ..Default::default()
        };

        for result in results {
            if result.pass {
                summary.passed += 1;
            } else {
                summary.failed += 1;
                summary.by_severity.increment(result.severity);
            }
        }

        summary
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
