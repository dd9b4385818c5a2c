//! Errors raised by evaluators and caller-supplied scoring strategies.

use thiserror::Error;

/// An evaluator runtime fault.
///
/// The engine never propagates these. Each one becomes a failing
/// `Runtime Error: <name>` result in the report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluatorError {
    #[error("{0}")]
    Failed(String),

    #[error("scorer failed: {0}")]
    Scorer(String),

    #[error("verifier failed: {0}")]
    Verifier(String),

    #[error("invalid schema: {0}")]
    Schema(String),
}

impl EvaluatorError {
    /// Convenience for user-defined checks.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
