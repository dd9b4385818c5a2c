//! Orchestration engine.
//!
//! Runs a list of evaluators against one response and reduces their results
//! into an [`EvaluationReport`]. It implements:
//! - Strictly sequential evaluation in list order
//! - Per-evaluator fault isolation (errors and panics become failing results)
//! - Optional stop after the first error-severity failure
//! - Deterministic aggregation through the [`Aggregator`]
//!
//! There is no timeout: a hung scorer or verifier stalls the whole run.
//! Callers needing a bound must wrap their own callback.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;

use crate::aggregate::Aggregator;
use crate::evaluator::Evaluator;
use crate::types::{EvaluationContext, EvaluationReport, EvaluationResult};

/// Reported name for evaluators without one.
pub const ANONYMOUS_EVALUATOR: &str = "Anonymous Evaluator";

/// One run's configuration: what to check, with which context.
#[derive(Clone)]
pub struct EvaluationConfig {
    pub test_name: String,

    /// Invoked in this order
    pub evaluators: Vec<Arc<dyn Evaluator>>,

    /// Passed unmodified to every evaluator
    pub context: Option<EvaluationContext>,

    /// Stop after the first failing error-severity result
    pub stop_on_first_failure: bool,
}

impl EvaluationConfig {
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            evaluators: Vec::new(),
            context: None,
            stop_on_first_failure: false,
        }
    }

    /// Append an evaluator.
    pub fn evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluators.push(Arc::new(evaluator));
        self
    }

    /// Append an evaluator shared with other configs.
    pub fn shared_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluators.push(evaluator);
        self
    }

    pub fn context(mut self, context: EvaluationContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn stop_on_first_failure(mut self, stop: bool) -> Self {
        self.stop_on_first_failure = stop;
        self
    }
}

impl fmt::Debug for EvaluationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .evaluators
            .iter()
            .map(|e| e.name().unwrap_or(ANONYMOUS_EVALUATOR))
            .collect();

        f.debug_struct("EvaluationConfig")
            .field("test_name", &self.test_name)
            .field("evaluators", &names)
            .field("context", &self.context)
            .field("stop_on_first_failure", &self.stop_on_first_failure)
            .finish()
    }
}

/// Evaluate one response.
///
/// Never fails: evaluator errors and panics surface as
/// `Runtime Error: <name>` results inside the report.
///
/// # Execution Flow
/// 1. Invoke each evaluator in list order with `(response, context)`
/// 2. Capture its result, or synthesize an error-severity failure
/// 3. Stop early if configured and the result is a blocking failure
/// 4. Aggregate into a timestamped report
pub async fn evaluate(response: &str, config: &EvaluationConfig) -> EvaluationReport {
    let context = config.context.as_ref();
    let mut results = Vec::with_capacity(config.evaluators.len());

    for (index, evaluator) in config.evaluators.iter().enumerate() {
        let result = run_isolated(evaluator.as_ref(), response, context).await;

        tracing::debug!(
            test = %config.test_name,
            evaluator = %result.name,
            pass = result.pass,
            score = result.score,
            "evaluator finished"
        );

        let stop = config.stop_on_first_failure && result.is_blocking_failure();
        results.push(result);

        if stop {
            tracing::info!(
                test = %config.test_name,
                skipped = config.evaluators.len() - index - 1,
                "stopping after first error-severity failure"
            );
            break;
        }
    }

    let report = Aggregator::new().aggregate(config.test_name.clone(), results);

    tracing::debug!(
        test = %report.test_name,
        overall_pass = report.overall_pass,
        overall_score = report.overall_score,
        passed = report.summary.passed,
        total = report.summary.total,
        "evaluation complete"
    );

    report
}

/// Evaluate several responses against the same config.
///
/// Runs are polled concurrently on the current task; each run is still
/// sequential internally. Reports come back in input order.
pub async fn evaluate_batch<S>(responses: &[S], config: &EvaluationConfig) -> Vec<EvaluationReport>
where
    S: AsRef<str>,
{
    join_all(responses.iter().map(|r| evaluate(r.as_ref(), config))).await
}

/// Run one evaluator, converting errors and panics into a failing result.
async fn run_isolated(
    evaluator: &dyn Evaluator,
    response: &str,
    context: Option<&EvaluationContext>,
) -> EvaluationResult {
    let name = evaluator.name().unwrap_or(ANONYMOUS_EVALUATOR);

    match AssertUnwindSafe(evaluator.evaluate(response, context))
        .catch_unwind()
        .await
    {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::warn!(evaluator = name, error = %e, "evaluator failed");
            EvaluationResult::runtime_error(name, e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(evaluator = name, panic = %message, "evaluator panicked");
            EvaluationResult::runtime_error(name, message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
