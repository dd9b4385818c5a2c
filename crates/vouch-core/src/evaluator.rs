//! The evaluator contract.
//!
//! A check is anything that, given a response and optional context,
//! asynchronously produces exactly one [`EvaluationResult`] or fails with an
//! [`EvaluatorError`]. Built-in checks are constructed by factory functions
//! that only capture configuration; user code may implement [`Evaluator`]
//! directly or wrap an async closure with [`custom`].

use std::future::Future;

use async_trait::async_trait;

use crate::error::EvaluatorError;
use crate::types::{EvaluationContext, EvaluationResult};

/// Trait implemented by every check.
///
/// # Contract
/// - MUST NOT mutate shared state between invocations
/// - MUST treat `response` and `context` as read-only
/// - MUST handle a missing context field itself (fail or skip), never panic
/// - SHOULD return a score in `[0, 1]`
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Identifier used when the evaluator fails at runtime.
    ///
    /// `None` reports as `Anonymous Evaluator`.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Score one response.
    async fn evaluate(
        &self,
        response: &str,
        context: Option<&EvaluationContext>,
    ) -> Result<EvaluationResult, EvaluatorError>;
}

/// An evaluator backed by an async closure.
///
/// The closure receives owned copies of the response and context so the
/// returned future may be `'static`.
pub struct FnEvaluator<F> {
    name: Option<String>,
    func: F,
}

impl<F, Fut> FnEvaluator<F>
where
    F: Fn(String, Option<EvaluationContext>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<EvaluationResult, EvaluatorError>> + Send + 'static,
{
    /// Wrap a closure without a name.
    pub fn anonymous(func: F) -> Self {
        Self { name: None, func }
    }
}

#[async_trait]
impl<F, Fut> Evaluator for FnEvaluator<F>
where
    F: Fn(String, Option<EvaluationContext>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<EvaluationResult, EvaluatorError>> + Send + 'static,
{
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    async fn evaluate(
        &self,
        response: &str,
        context: Option<&EvaluationContext>,
    ) -> Result<EvaluationResult, EvaluatorError> {
        (self.func)(response.to_string(), context.cloned()).await
    }
}

/// Build a named user-defined check from an async closure.
///
/// ```rust,ignore
/// let no_apologies = custom("noApologies", |response, _ctx| async move {
///     let apologetic = response.to_lowercase().contains("i apologize");
///     Ok(EvaluationResult::new("noApologies", Category::Guardrail, Severity::Warning)
///         .with_outcome(!apologetic, if apologetic { 0.0 } else { 1.0 }))
/// });
/// ```
pub fn custom<F, Fut>(name: impl Into<String>, func: F) -> FnEvaluator<F>
where
    F: Fn(String, Option<EvaluationContext>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<EvaluationResult, EvaluatorError>> + Send + 'static,
{
    FnEvaluator {
        name: Some(name.into()),
        func,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Severity};

    #[tokio::test]
    async fn test_custom_evaluator_runs_closure() {
        let check = custom("noApologies", |response: String, _ctx| async move {
            let apologetic = response.to_lowercase().contains("sorry");
            Ok::<_, EvaluatorError>(
                EvaluationResult::new("noApologies", Category::Guardrail, Severity::Warning)
                    .with_outcome(!apologetic, if apologetic { 0.0 } else { 1.0 }),
            )
        });

        assert_eq!(check.name(), Some("noApologies"));

        let result = check.evaluate("Sorry about that.", None).await.unwrap();
        assert!(!result.pass);

        let result = check.evaluate("Here is your answer.", None).await.unwrap();
        assert!(result.pass);
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_closure_sees_context() {
        let echo_prompt = |_response: String, ctx: Option<EvaluationContext>| async move {
            match ctx.and_then(|c| c.prompt) {
                Some(prompt) => Ok(
                    EvaluationResult::new("echo", Category::Consistency, Severity::Info)
                        .with_outcome(true, 1.0)
                        .with_details(prompt),
                ),
                None => Err(EvaluatorError::failed("prompt required")),
            }
        };
        let check = FnEvaluator::anonymous(echo_prompt);

        assert_eq!(check.name(), None);
        assert!(check.evaluate("x", None).await.is_err());

        let context = EvaluationContext::new().with_prompt("hello");
        let result = check.evaluate("x", Some(&context)).await.unwrap();
        assert_eq!(result.details, "hello");
    }
}
