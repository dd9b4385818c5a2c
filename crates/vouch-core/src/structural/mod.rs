//! Structural evaluators.
//!
//! Pure, synchronous scoring logic: length bounds, required JSON fields and
//! JSON Schema conformance. None of these make external calls.
//!
//! | Evaluator | Score | Pass |
//! |-----------|-------|------|
//! | `max_length` | 1 within limit, then decays linearly to 0 at twice the limit | `len <= limit` |
//! | `min_length` | `min(1, len / minimum)` | `len >= minimum` |
//! | `required_fields` | fraction of keys present | all present |
//! | `json_schema` | 1 valid / 0 invalid | valid |

mod json;
mod length;

pub use json::{json_schema, required_fields, JsonSchema, RequiredFields};
pub use length::{max_length, min_length, MaxLength, MinLength};

use serde_json::Value;

/// Parse a response as JSON, describing the failure for `details` on error.
pub(crate) fn parse_json(response: &str) -> Result<Value, String> {
    serde_json::from_str(response).map_err(|e| format!("Response is not valid JSON: {}", e))
}

/// Render a JSON pointer (`/items/0/id`) as a dotted path (`items.0.id`).
pub(crate) fn display_path(pointer: &str) -> String {
    if pointer.is_empty() {
        "(root)".to_string()
    } else {
        pointer.trim_start_matches('/').replace('/', ".")
    }
}

/// Human-readable JSON type name.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_reports_error() {
        let err = parse_json("{not json").unwrap_err();
        assert!(err.starts_with("Response is not valid JSON"));
        assert!(parse_json(r#"{"a": 1}"#).is_ok());
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&serde_json::json!([1, 2])), "array");
        assert_eq!(json_type_name(&serde_json::json!(null)), "null");
        assert_eq!(json_type_name(&serde_json::json!({})), "object");
    }
}
