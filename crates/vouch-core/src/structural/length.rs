//! Length bounds.
//!
//! Length is measured in Unicode scalar values (`chars().count()`), not bytes.

use async_trait::async_trait;

use crate::error::EvaluatorError;
use crate::evaluator::Evaluator;
use crate::types::{Category, EvaluationContext, EvaluationResult, Severity};

const MAX_LENGTH: &str = "max_length";
const MIN_LENGTH: &str = "min_length";

/// Upper bound on response length.
#[derive(Debug, Clone)]
pub struct MaxLength {
    limit: usize,
    severity: Severity,
}

/// Fail responses longer than `limit` characters.
pub fn max_length(limit: usize) -> MaxLength {
    MaxLength {
        limit,
        severity: Severity::Error,
    }
}

impl MaxLength {
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// 1 within the limit, then `1 - overage / limit`, floored at 0.
    fn score(&self, length: usize) -> f64 {
        if length <= self.limit {
            return 1.0;
        }
        if self.limit == 0 {
            return 0.0;
        }
        let overage = (length - self.limit) as f64;
        (1.0 - overage / self.limit as f64).max(0.0)
    }
}

#[async_trait]
impl Evaluator for MaxLength {
    fn name(&self) -> Option<&str> {
        Some(MAX_LENGTH)
    }

    async fn evaluate(
        &self,
        response: &str,
        _context: Option<&EvaluationContext>,
    ) -> Result<EvaluationResult, EvaluatorError> {
        let length = response.chars().count();
        let pass = length <= self.limit;

        let details = if pass {
            format!("Length {} is within limit {}", length, self.limit)
        } else {
            format!(
                "Length {} exceeds limit {} by {}",
                length,
                self.limit,
                length - self.limit
            )
        };

        Ok(
            EvaluationResult::new(MAX_LENGTH, Category::Structural, self.severity)
                .with_outcome(pass, self.score(length))
                .with_threshold(self.limit as f64)
                .with_details(details)
                .with_entry("length", length)
                .with_entry("limit", self.limit),
        )
    }
}

/// Lower bound on response length.
#[derive(Debug, Clone)]
pub struct MinLength {
    minimum: usize,
    severity: Severity,
}

/// Fail responses shorter than `minimum` characters.
pub fn min_length(minimum: usize) -> MinLength {
    MinLength {
        minimum,
        severity: Severity::Error,
    }
}

impl MinLength {
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn score(&self, length: usize) -> f64 {
        if self.minimum == 0 {
            return 1.0;
        }
        (length as f64 / self.minimum as f64).min(1.0)
    }
}

#[async_trait]
impl Evaluator for MinLength {
    fn name(&self) -> Option<&str> {
        Some(MIN_LENGTH)
    }

    async fn evaluate(
        &self,
        response: &str,
        _context: Option<&EvaluationContext>,
    ) -> Result<EvaluationResult, EvaluatorError> {
        let length = response.chars().count();
        let pass = length >= self.minimum;

        let details = if pass {
            format!("Length {} meets minimum {}", length, self.minimum)
        } else {
            format!(
                "Length {} is below minimum {} by {}",
                length,
                self.minimum,
                self.minimum - length
            )
        };

        Ok(
            EvaluationResult::new(MIN_LENGTH, Category::Structural, self.severity)
                .with_outcome(pass, self.score(length))
                .with_threshold(self.minimum as f64)
                .with_details(details)
                .with_entry("length", length)
                .with_entry("minimum", self.minimum),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_max_length_within_limit() {
        let result = max_length(100).evaluate("short answer", None).await.unwrap();
        assert!(result.pass);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.metadata["length"], 12);
    }

    #[tokio::test]
    async fn test_max_length_half_overage() {
        let response = "a".repeat(150);
        let result = max_length(100).evaluate(&response, None).await.unwrap();
        assert!(!result.pass);
        assert_eq!(result.score, 0.5);
        assert_eq!(result.severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_max_length_clamps_to_zero() {
        let response = "a".repeat(600);
        let result = max_length(100).evaluate(&response, None).await.unwrap();
        assert!(!result.pass);
        assert_eq!(result.score, 0.0);

        let response = "a".repeat(200);
        let result = max_length(100).evaluate(&response, None).await.unwrap();
        assert_eq!(result.score, 0.0);
    }

    #[tokio::test]
    async fn test_max_length_counts_chars_not_bytes() {
        let result = max_length(3).evaluate("héé", None).await.unwrap();
        assert!(result.pass);
    }

    #[tokio::test]
    async fn test_min_length_half() {
        let response = "a".repeat(50);
        let result = min_length(100).evaluate(&response, None).await.unwrap();
        assert!(!result.pass);
        assert_eq!(result.score, 0.5);
    }

    #[tokio::test]
    async fn test_min_length_zero_minimum() {
        let result = min_length(0).evaluate("", None).await.unwrap();
        assert!(result.pass);
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_severity_override() {
        let result = min_length(10)
            .severity(Severity::Warning)
            .evaluate("hi", None)
            .await
            .unwrap();
        assert_eq!(result.severity, Severity::Warning);
        assert!(!result.is_blocking_failure());
    }

    proptest! {
        #[test]
        fn prop_length_scores_in_unit_interval(text in ".{0,300}", bound in 0usize..200) {
            let max = block_on(max_length(bound).evaluate(&text, None)).unwrap();
            prop_assert!((0.0..=1.0).contains(&max.score));
            prop_assert_eq!(max.pass, text.chars().count() <= bound);

            let min = block_on(min_length(bound).evaluate(&text, None)).unwrap();
            prop_assert!((0.0..=1.0).contains(&min.score));
            prop_assert_eq!(min.pass, text.chars().count() >= bound);
        }
    }
}
