//! Declarative test suites.
//!
//! A suite is a YAML or JSON document listing test cases, each with a
//! response (inline or from a file), optional context and the evaluators to
//! run. Documents are validated against an embedded JSON Schema, then checked
//! for semantic errors before any evaluator is built.

mod parser;
mod schema;

pub use parser::{EvaluatorSpec, NamedPattern, SuiteConfig, SuiteError, TestCase};
pub use schema::validate_suite_schema;
