//! JSON Schema validation for suite documents.
//!
//! Every suite file must validate against `schemas/suite.schema.json`
//! before it is deserialized.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;

use crate::structural::display_path;

use super::parser::SuiteError;

/// Embedded suite schema (loaded at compile time).
const SUITE_SCHEMA_JSON: &str = include_str!("../../schemas/suite.schema.json");

/// Compiled once on first use. A broken embedded schema is remembered as a
/// message so every later load reports the same failure.
static SUITE_VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();

fn compile_suite_schema() -> Result<Validator, String> {
    let schema: Value = serde_json::from_str(SUITE_SCHEMA_JSON)
        .map_err(|e| format!("embedded schema is not JSON: {}", e))?;
    jsonschema::options()
        .build(&schema)
        .map_err(|e| format!("embedded schema does not compile: {}", e))
}

fn suite_validator() -> Result<&'static Validator, SuiteError> {
    SUITE_VALIDATOR
        .get_or_init(compile_suite_schema)
        .as_ref()
        .map_err(|message| SuiteError::SchemaUnavailable(message.clone()))
}

/// Validate a suite document.
///
/// Every violation is reported as `<path>: <message>`, with the same dotted
/// paths the `json_schema` evaluator uses.
pub fn validate_suite_schema(document: &Value) -> Result<(), SuiteError> {
    let violations: Vec<String> = suite_validator()?
        .iter_errors(document)
        .map(|e| format!("{}: {}", display_path(&e.instance_path.to_string()), e))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SuiteError::SchemaError(violations))
    }
}
