//! Core data types shared by evaluators, the engine and reporters.
//!
//! Field names serialize in camelCase; reporters and downstream exporters
//! depend on them staying stable.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open diagnostic map attached to every result.
///
/// Metadata is never consulted by the engine.
pub type Metadata = Map<String, Value>;

/// Concern grouping of an evaluator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Structural,
    Guardrail,
    Semantic,
    Consistency,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Structural => "structural",
            Category::Guardrail => "guardrail",
            Category::Semantic => "semantic",
            Category::Consistency => "consistency",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gating weight of a failed check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A failure flips the overall verdict.
    #[default]
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Whether a failure at this severity fails the whole report.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a raw score into `[0, 1]`. NaN becomes 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// One evaluator's verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// Evaluator identifier
    pub name: String,

    /// Whether the check passed
    pub pass: bool,

    /// Normalized score in `[0, 1]`
    pub score: f64,

    /// Evaluator-defined comparison point
    pub threshold: f64,

    pub category: Category,

    pub severity: Severity,

    /// Human-readable explanation
    pub details: String,

    /// Evaluator-specific diagnostics
    #[serde(default)]
    pub metadata: Metadata,
}

impl EvaluationResult {
    /// Start a failing, zero-scored result. Use the `with_*` methods to fill it in.
    pub fn new(name: impl Into<String>, category: Category, severity: Severity) -> Self {
        Self {
            name: name.into(),
            pass: false,
            score: 0.0,
            threshold: 0.0,
            category,
            severity,
            details: String::new(),
            metadata: Metadata::new(),
        }
    }

    /// Synthesized result for an evaluator that raised an error or panicked.
    pub fn runtime_error(evaluator_name: &str, message: impl Into<String>) -> Self {
        Self::new(
            format!("Runtime Error: {}", evaluator_name),
            Category::Structural,
            Severity::Error,
        )
        .with_details(message)
    }

    /// Set pass/fail and score. The score is clamped into `[0, 1]`.
    pub fn with_outcome(mut self, pass: bool, score: f64) -> Self {
        self.pass = pass;
        self.score = clamp_score(score);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Replace the whole metadata map.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a single metadata entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// True when this result fails the overall verdict.
    pub fn is_blocking_failure(&self) -> bool {
        !self.pass && self.severity.is_blocking()
    }
}

/// Auxiliary run-scoped data threaded unmodified to every evaluator.
///
/// Serializes as camelCase; suite files may also use snake_case keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(default, alias = "reference_response", skip_serializing_if = "Option::is_none")]
    pub reference_response: Option<String>,

    #[serde(default, alias = "retrieved_documents")]
    pub retrieved_documents: Vec<String>,

    #[serde(default)]
    pub history: Vec<String>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_reference_response(mut self, reference: impl Into<String>) -> Self {
        self.reference_response = Some(reference.into());
        self
    }

    pub fn with_retrieved_documents(mut self, documents: Vec<String>) -> Self {
        self.retrieved_documents = documents;
        self
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }
}

/// Failed results per severity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }

    pub(crate) fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Counts over a report's results.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub by_severity: SeverityCounts,
}

/// The aggregated outcome of one run of a set of evaluators against one response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub test_name: String,

    pub timestamp: DateTime<Utc>,

    /// False iff some error-severity result failed
    pub overall_pass: bool,

    /// Arithmetic mean of result scores, 0 when there are none
    pub overall_score: f64,

    /// One entry per evaluator invoked, in invocation order
    pub results: Vec<EvaluationResult>,

    pub summary: ReportSummary,
}

impl EvaluationReport {
    /// All failing results, whatever their severity.
    pub fn failures(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.results.iter().filter(|r| !r.pass)
    }

    /// Failing results that decide `overall_pass`.
    pub fn blocking_failures(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.results.iter().filter(|r| r.is_blocking_failure())
    }

    /// Look up a result by evaluator name.
    pub fn result(&self, name: &str) -> Option<&EvaluationResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_clamped() {
        let high = EvaluationResult::new("x", Category::Structural, Severity::Error)
            .with_outcome(true, 1.7);
        assert_eq!(high.score, 1.0);

        let low = EvaluationResult::new("x", Category::Structural, Severity::Error)
            .with_outcome(false, -0.2);
        assert_eq!(low.score, 0.0);

        assert_eq!(clamp_score(f64::NAN), 0.0);
    }

    #[test]
    fn test_runtime_error_shape() {
        let result = EvaluationResult::runtime_error("noApologies", "boom");
        assert_eq!(result.name, "Runtime Error: noApologies");
        assert!(!result.pass);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.threshold, 0.0);
        assert_eq!(result.category, Category::Structural);
        assert_eq!(result.severity, Severity::Error);
        assert_eq!(result.details, "boom");
        assert!(result.is_blocking_failure());
    }

    #[test]
    fn test_warning_failure_is_not_blocking() {
        let result = EvaluationResult::new("onTopic", Category::Guardrail, Severity::Warning);
        assert!(!result.pass);
        assert!(!result.is_blocking_failure());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = EvaluationResult::new("maxLength", Category::Structural, Severity::Error)
            .with_outcome(true, 1.0)
            .with_threshold(100.0)
            .with_entry("length", 42);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["name"], "maxLength");
        assert_eq!(value["category"], "structural");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["metadata"]["length"], 42);
    }

    #[test]
    fn test_context_deserializes_with_defaults() {
        let context: EvaluationContext =
            serde_json::from_str(r#"{"prompt": "What is Rust?"}"#).unwrap();
        assert_eq!(context.prompt.as_deref(), Some("What is Rust?"));
        assert!(context.retrieved_documents.is_empty());
        assert!(context.history.is_empty());
        assert!(context.reference_response.is_none());
    }

    #[test]
    fn test_context_accepts_snake_case_keys() {
        let context: EvaluationContext = serde_json::from_str(
            r#"{"reference_response": "ref", "retrieved_documents": ["doc"]}"#,
        )
        .unwrap();
        assert_eq!(context.reference_response.as_deref(), Some("ref"));
        assert_eq!(context.retrieved_documents, vec!["doc".to_string()]);
    }
}
