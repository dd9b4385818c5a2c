//! Topic relevance.
//!
//! Default scoring is keyword overlap: the share of significant topic words
//! that also appear in the response. A [`RelevanceScorer`] can replace it
//! (e.g. embedding similarity).

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EvaluatorError;
use crate::evaluator::Evaluator;
use crate::types::{clamp_score, Category, EvaluationContext, EvaluationResult, Severity};

use super::RelevanceScorer;

const ON_TOPIC: &str = "on_topic";

/// Default minimum relevance.
pub const DEFAULT_TOPIC_THRESHOLD: f64 = 0.3;

/// Tokens this short are ignored.
const MIN_TOKEN_CHARS: usize = 3;

/// Relevance of a response to a topic. Warning severity by default.
#[derive(Clone)]
pub struct OnTopic {
    topic: String,
    threshold: f64,
    scorer: Option<Arc<dyn RelevanceScorer>>,
    severity: Severity,
}

/// Check that the response stays on `topic`.
pub fn on_topic(topic: impl Into<String>) -> OnTopic {
    OnTopic {
        topic: topic.into(),
        threshold: DEFAULT_TOPIC_THRESHOLD,
        scorer: None,
        severity: Severity::Warning,
    }
}

impl fmt::Debug for OnTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnTopic")
            .field("topic", &self.topic)
            .field("threshold", &self.threshold)
            .field("custom_scorer", &self.scorer.is_some())
            .field("severity", &self.severity)
            .finish()
    }
}

impl OnTopic {
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Replace keyword overlap with a custom relevance scorer.
    pub fn scorer(mut self, scorer: impl RelevanceScorer + 'static) -> Self {
        self.scorer = Some(Arc::new(scorer));
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn result(&self) -> EvaluationResult {
        EvaluationResult::new(ON_TOPIC, Category::Guardrail, self.severity)
            .with_threshold(self.threshold)
            .with_entry("topic", self.topic.as_str())
    }

    fn finish(&self, result: EvaluationResult, score: f64, summary: String) -> EvaluationResult {
        let pass = score >= self.threshold;
        result.with_outcome(pass, score).with_details(format!(
            "Topic relevance {:.2} (threshold {:.2}): {}",
            score, self.threshold, summary
        ))
    }
}

/// Lowercase, strip punctuation, split on whitespace, drop short tokens.
fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Evaluator for OnTopic {
    fn name(&self) -> Option<&str> {
        Some(ON_TOPIC)
    }

    async fn evaluate(
        &self,
        response: &str,
        _context: Option<&EvaluationContext>,
    ) -> Result<EvaluationResult, EvaluatorError> {
        if self.topic.trim().is_empty() {
            return Ok(self
                .result()
                .with_outcome(true, 1.0)
                .with_details("No topic given"));
        }

        if let Some(scorer) = &self.scorer {
            let raw = scorer.score(response, &self.topic).await?;
            let score = clamp_score(raw);
            if score != raw {
                tracing::debug!(raw, clamped = score, "relevance scorer output clamped");
            }
            let result = self
                .result()
                .with_entry("scorer", "custom")
                .with_entry("rawScore", raw);
            return Ok(self.finish(result, score, "custom scorer".to_string()));
        }

        let mut topic_tokens: Vec<String> = Vec::new();
        for token in tokenize(&self.topic) {
            if !topic_tokens.contains(&token) {
                topic_tokens.push(token);
            }
        }

        if topic_tokens.is_empty() {
            return Ok(self
                .result()
                .with_outcome(true, 1.0)
                .with_details("Topic has no significant terms"));
        }

        let response_tokens: HashSet<String> = tokenize(response).into_iter().collect();
        let (matched, missing): (Vec<String>, Vec<String>) = topic_tokens
            .iter()
            .cloned()
            .partition(|token| response_tokens.contains(token));

        let score = matched.len() as f64 / topic_tokens.len() as f64;
        let summary = format!(
            "matched {} of {} topic terms",
            matched.len(),
            topic_tokens.len()
        );

        let result = self
            .result()
            .with_entry("scorer", "keyword")
            .with_entry("matchedTerms", matched)
            .with_entry("missingTerms", missing);

        Ok(self.finish(result, score, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use proptest::prelude::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Rust's borrow-checker, in a NUTSHELL!"),
            ["rusts", "borrowchecker", "nutshell"]
        );
    }

    #[tokio::test]
    async fn test_on_topic_keyword_overlap() {
        let result = on_topic("rust ownership borrowing")
            .evaluate("Ownership in Rust means each value has one owner.", None)
            .await
            .unwrap();
        // "rust" and "ownership" present, "borrowing" missing
        assert!((result.score - 2.0 / 3.0).abs() < 1e-9);
        assert!(result.pass);
        assert_eq!(result.severity, Severity::Warning);
        assert_eq!(result.threshold, DEFAULT_TOPIC_THRESHOLD);
        assert_eq!(result.metadata["missingTerms"], serde_json::json!(["borrowing"]));
    }

    #[tokio::test]
    async fn test_off_topic_fails_with_warning() {
        let result = on_topic("quantum computing qubits")
            .evaluate("Here is a recipe for banana bread.", None)
            .await
            .unwrap();
        assert!(!result.pass);
        assert_eq!(result.score, 0.0);
        assert!(!result.is_blocking_failure());
    }

    #[tokio::test]
    async fn test_duplicate_topic_terms_counted_once() {
        let result = on_topic("rust rust rust cargo")
            .evaluate("I love rust.", None)
            .await
            .unwrap();
        assert_eq!(result.score, 0.5);
    }

    #[tokio::test]
    async fn test_empty_topic_always_passes() {
        for topic in ["", "   ", "a an of"] {
            let result = on_topic(topic).evaluate("anything", None).await.unwrap();
            assert!(result.pass);
            assert_eq!(result.score, 1.0);
        }
    }

    #[tokio::test]
    async fn test_custom_scorer_is_clamped() {
        let check = on_topic("databases")
            .threshold(0.8)
            .scorer(|_response: String, _topic: String| async move {
                Ok::<f64, EvaluatorError>(1.4)
            });
        let result = check.evaluate("Postgres is great", None).await.unwrap();
        assert_eq!(result.score, 1.0);
        assert!(result.pass);
        assert_eq!(result.metadata["scorer"], "custom");

        let check = on_topic("databases")
            .scorer(|_response: String, _topic: String| async move {
                Ok::<f64, EvaluatorError>(-3.0)
            });
        let result = check.evaluate("Postgres is great", None).await.unwrap();
        assert_eq!(result.score, 0.0);
        assert!(!result.pass);
    }

    #[tokio::test]
    async fn test_custom_scorer_error_propagates() {
        let check = on_topic("databases").scorer(|_response: String, _topic: String| async move {
            Err::<f64, EvaluatorError>(EvaluatorError::Scorer("embedding service down".into()))
        });
        let err = check.evaluate("Postgres", None).await.unwrap_err();
        assert_eq!(err, EvaluatorError::Scorer("embedding service down".into()));
    }

    proptest! {
        #[test]
        fn prop_keyword_score_in_unit_interval(text in ".{0,200}", topic in ".{0,40}") {
            let result = block_on(on_topic(topic).evaluate(&text, None)).unwrap();
            prop_assert!((0.0..=1.0).contains(&result.score));
            prop_assert_eq!(result.pass, result.score >= DEFAULT_TOPIC_THRESHOLD);
        }

        #[test]
        fn prop_custom_scorer_output_is_clamped(
            text in ".{0,80}",
            raw in prop_oneof![any::<f64>(), -5.0f64..5.0],
            threshold in 0.0f64..=1.0,
        ) {
            let check = on_topic("rust ownership")
                .threshold(threshold)
                .scorer(move |_response: String, _topic: String| async move {
                    Ok::<f64, EvaluatorError>(raw)
                });
            let result = block_on(check.evaluate(&text, None)).unwrap();
            prop_assert!((0.0..=1.0).contains(&result.score));
            prop_assert_eq!(result.pass, result.score >= threshold);
        }
    }
}
