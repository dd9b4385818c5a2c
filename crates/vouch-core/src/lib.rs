//! # vouch-core
//!
//! Assertion engine for non-deterministic text outputs.
//!
//! This crate scores a model response with a list of pluggable checks and
//! folds their results into one report, answering:
//! - Does the response have the right shape?
//! - Does it stay inside policy?
//! - Should this run be treated as a failure?
//!
//! ## Key Guarantees
//!
//! 1. **Isolated**: An evaluator that errors or panics becomes one failing
//!    result; the others still run
//! 2. **Ordered**: Results follow evaluator order exactly
//! 3. **Severity-gated**: Only error-severity failures fail a report
//! 4. **No network**: Semantic judgment is injected by the caller as a
//!    scorer or verifier
//!
//! ## Example
//!
//! ```rust,ignore
//! use vouch_core::{evaluate, EvaluationConfig};
//! use vouch_core::guardrails::{no_personal_data, on_topic};
//! use vouch_core::structural::max_length;
//!
//! let config = EvaluationConfig::new("support-answer")
//!     .evaluator(max_length(500))
//!     .evaluator(no_personal_data())
//!     .evaluator(on_topic("billing"));
//!
//! let report = evaluate("Your invoice is under Billing.", &config).await;
//! print!("{}", vouch_core::report::console::render(&report));
//! ```

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod guardrails;
pub mod report;
pub mod structural;
pub mod suite;
pub mod types;

// Re-export main types at crate root
pub use aggregate::Aggregator;
pub use engine::{evaluate, evaluate_batch, EvaluationConfig, ANONYMOUS_EVALUATOR};
pub use error::EvaluatorError;
pub use evaluator::{custom, Evaluator, FnEvaluator};
pub use report::ReportFormat;
pub use suite::{EvaluatorSpec, SuiteConfig, SuiteError, TestCase};
pub use types::{
    Category, EvaluationContext, EvaluationReport, EvaluationResult, Metadata, ReportSummary,
    Severity, SeverityCounts,
};
