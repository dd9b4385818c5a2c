//! Guardrail evaluators.
//!
//! Policy and safety checks: personal data, topic relevance, hallucinated
//! links and toxicity. The heuristics here are intentionally approximate.
//! Each guardrail that needs semantic judgment accepts a caller-supplied
//! strategy (`scorer` or `verifier`) invoked at exactly one point; any
//! network I/O lives in that strategy, never in this crate.
//!
//! | Guardrail | Default severity | Injectable strategy |
//! |-----------|------------------|---------------------|
//! | `no_personal_data` | error | none (custom patterns) |
//! | `on_topic` | warning | [`RelevanceScorer`] |
//! | `no_hallucinated_urls` | error | [`UrlVerifier`] |
//! | `toxicity` | error | [`ToxicityScorer`] |

mod patterns;
mod personal_data;
mod topic;
mod toxicity;
mod urls;

pub use patterns::PiiCategory;
pub use personal_data::{no_personal_data, NoPersonalData};
pub use topic::{on_topic, OnTopic, DEFAULT_TOPIC_THRESHOLD};
pub use toxicity::{toxicity, Toxicity, DEFAULT_TOXICITY_THRESHOLD};
pub use urls::{no_hallucinated_urls, FlagReason, NoHallucinatedUrls};

use std::future::Future;

use async_trait::async_trait;

use crate::error::EvaluatorError;

/// Scores how relevant a response is to a topic (e.g. embedding similarity).
///
/// Output is clamped to `[0, 1]` by the caller. An `Err` fails the evaluator.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, response: &str, topic: &str) -> Result<f64, EvaluatorError>;
}

#[async_trait]
impl<F, Fut> RelevanceScorer for F
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<f64, EvaluatorError>> + Send + 'static,
{
    async fn score(&self, response: &str, topic: &str) -> Result<f64, EvaluatorError> {
        (self)(response.to_string(), topic.to_string()).await
    }
}

/// Produces a raw toxicity value for a response (higher is more toxic).
#[async_trait]
pub trait ToxicityScorer: Send + Sync {
    async fn score(&self, response: &str) -> Result<f64, EvaluatorError>;
}

#[async_trait]
impl<F, Fut> ToxicityScorer for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<f64, EvaluatorError>> + Send + 'static,
{
    async fn score(&self, response: &str) -> Result<f64, EvaluatorError> {
        (self)(response.to_string()).await
    }
}

/// Decides whether a structurally valid URL is real (e.g. a HEAD request).
///
/// An `Err` is not propagated: the URL is flagged as `verification failed`.
#[async_trait]
pub trait UrlVerifier: Send + Sync {
    async fn verify(&self, url: &str) -> Result<bool, EvaluatorError>;
}

#[async_trait]
impl<F, Fut> UrlVerifier for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, EvaluatorError>> + Send + 'static,
{
    async fn verify(&self, url: &str) -> Result<bool, EvaluatorError> {
        (self)(url.to_string()).await
    }
}
