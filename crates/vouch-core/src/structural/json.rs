//! JSON shape checks: required keys and JSON Schema conformance.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::EvaluatorError;
use crate::evaluator::Evaluator;
use crate::types::{Category, EvaluationContext, EvaluationResult, Severity};

use super::{display_path, json_type_name, parse_json};

const REQUIRED_FIELDS: &str = "required_fields";
const JSON_SCHEMA: &str = "json_schema";

/// Required top-level keys on a JSON object response.
#[derive(Debug, Clone)]
pub struct RequiredFields {
    fields: Vec<String>,
    severity: Severity,
}

/// Require each of `fields` to be a key of the response object.
///
/// Presence is key membership: a key whose value is `null`, `0`, `false`
/// or `""` still counts as present.
pub fn required_fields<I, S>(fields: I) -> RequiredFields
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RequiredFields {
        fields: fields.into_iter().map(Into::into).collect(),
        severity: Severity::Error,
    }
}

impl RequiredFields {
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn result(&self) -> EvaluationResult {
        EvaluationResult::new(REQUIRED_FIELDS, Category::Structural, self.severity)
            .with_threshold(1.0)
    }
}

#[async_trait]
impl Evaluator for RequiredFields {
    fn name(&self) -> Option<&str> {
        Some(REQUIRED_FIELDS)
    }

    async fn evaluate(
        &self,
        response: &str,
        _context: Option<&EvaluationContext>,
    ) -> Result<EvaluationResult, EvaluatorError> {
        if self.fields.is_empty() {
            return Ok(self
                .result()
                .with_outcome(true, 1.0)
                .with_details("No fields required"));
        }

        let parsed = match parse_json(response) {
            Ok(value) => value,
            Err(details) => return Ok(self.result().with_details(details)),
        };

        let object = match parsed.as_object() {
            Some(object) => object,
            None => {
                return Ok(self.result().with_details(format!(
                    "Expected a JSON object, got {}",
                    json_type_name(&parsed)
                )))
            }
        };

        let (present, missing): (Vec<&String>, Vec<&String>) = self
            .fields
            .iter()
            .partition(|field| object.contains_key(field.as_str()));

        let score = present.len() as f64 / self.fields.len() as f64;
        let pass = missing.is_empty();

        let details = if pass {
            format!("All {} required fields present", self.fields.len())
        } else {
            format!(
                "Missing {} of {} required fields: {}",
                missing.len(),
                self.fields.len(),
                missing
                    .iter()
                    .map(|f| f.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };

        Ok(self
            .result()
            .with_outcome(pass, score)
            .with_details(details)
            .with_entry("present", json!(present))
            .with_entry("missing", json!(missing)))
    }
}

/// JSON Schema conformance check.
pub struct JsonSchema {
    /// Compiled once at construction; a bad schema surfaces when evaluated.
    validator: Result<jsonschema::Validator, String>,
    severity: Severity,
}

/// Validate the response against a JSON Schema document.
pub fn json_schema(schema: Value) -> JsonSchema {
    let validator = jsonschema::options()
        .build(&schema)
        .map_err(|e| e.to_string());

    JsonSchema {
        validator,
        severity: Severity::Error,
    }
}

impl JsonSchema {
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[async_trait]
impl Evaluator for JsonSchema {
    fn name(&self) -> Option<&str> {
        Some(JSON_SCHEMA)
    }

    async fn evaluate(
        &self,
        response: &str,
        _context: Option<&EvaluationContext>,
    ) -> Result<EvaluationResult, EvaluatorError> {
        let validator = self
            .validator
            .as_ref()
            .map_err(|e| EvaluatorError::Schema(e.clone()))?;

        let result = EvaluationResult::new(JSON_SCHEMA, Category::Structural, self.severity)
            .with_threshold(1.0);

        let instance = match parse_json(response) {
            Ok(value) => value,
            Err(details) => return Ok(result.with_details(details)),
        };

        let issues: Vec<(String, String)> = validator
            .iter_errors(&instance)
            .map(|e| (display_path(&e.instance_path.to_string()), e.to_string()))
            .collect();

        if issues.is_empty() {
            return Ok(result
                .with_outcome(true, 1.0)
                .with_details("Response conforms to schema"));
        }

        let details = issues
            .iter()
            .map(|(path, message)| format!("{}: {}", path, message))
            .collect::<Vec<_>>()
            .join("; ");

        let issue_list: Vec<Value> = issues
            .iter()
            .map(|(path, message)| json!({ "path": path, "message": message }))
            .collect();

        Ok(result
            .with_details(details)
            .with_entry("issueCount", issues.len())
            .with_entry("issues", issue_list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_required_fields_all_present() {
        let check = required_fields(["name", "age"]);
        let result = check
            .evaluate(r#"{"name": "Ada", "age": 36}"#, None)
            .await
            .unwrap();
        assert!(result.pass);
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_required_fields_partial() {
        let check = required_fields(["name", "age", "email", "city"]);
        let result = check.evaluate(r#"{"name": "Ada"}"#, None).await.unwrap();
        assert!(!result.pass);
        assert_eq!(result.score, 0.25);
        assert_eq!(result.metadata["missing"], json!(["age", "email", "city"]));
        assert!(result.details.contains("age, email, city"));
    }

    #[tokio::test]
    async fn test_required_fields_presence_is_key_membership() {
        let check = required_fields(["a", "b", "c", "d"]);
        let result = check
            .evaluate(r#"{"a": null, "b": 0, "c": false, "d": ""}"#, None)
            .await
            .unwrap();
        assert!(result.pass);
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_required_fields_empty_always_passes() {
        let check = required_fields(Vec::<String>::new());
        for response in ["not json at all", "[1, 2]", "{}"] {
            let result = check.evaluate(response, None).await.unwrap();
            assert!(result.pass);
            assert_eq!(result.score, 1.0);
        }
    }

    #[tokio::test]
    async fn test_required_fields_rejects_non_objects() {
        let check = required_fields(["id"]);

        let result = check.evaluate("[{\"id\": 1}]", None).await.unwrap();
        assert!(!result.pass);
        assert_eq!(result.score, 0.0);
        assert!(result.details.contains("array"));

        let result = check.evaluate("{oops", None).await.unwrap();
        assert!(!result.pass);
        assert_eq!(result.score, 0.0);
        assert!(result.details.contains("not valid JSON"));
    }

    fn person_schema() -> Value {
        json!({
            "type": "object",
            "required": ["name", "age"],
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "integer", "minimum": 0 }
            }
        })
    }

    #[tokio::test]
    async fn test_json_schema_valid() {
        let result = json_schema(person_schema())
            .evaluate(r#"{"name": "Ada", "age": 36}"#, None)
            .await
            .unwrap();
        assert!(result.pass);
        assert_eq!(result.score, 1.0);
    }

    #[tokio::test]
    async fn test_json_schema_lists_every_issue() {
        let result = json_schema(person_schema())
            .evaluate(r#"{"name": 7, "age": -1}"#, None)
            .await
            .unwrap();
        assert!(!result.pass);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.metadata["issueCount"], 2);
        assert!(result.details.contains("name: "));
        assert!(result.details.contains("age: "));
    }

    #[tokio::test]
    async fn test_json_schema_root_issue() {
        let result = json_schema(person_schema())
            .evaluate(r#"{"name": "Ada"}"#, None)
            .await
            .unwrap();
        assert!(!result.pass);
        assert!(result.details.starts_with("(root): "));
    }

    #[tokio::test]
    async fn test_json_schema_parse_failure() {
        let result = json_schema(person_schema())
            .evaluate("definitely not json", None)
            .await
            .unwrap();
        assert!(!result.pass);
        assert_eq!(result.score, 0.0);
        assert!(result.details.contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_json_schema_invalid_schema_is_runtime_error() {
        let check = json_schema(json!({ "type": "not-a-type" }));
        let err = check.evaluate("{}", None).await.unwrap_err();
        assert!(matches!(err, EvaluatorError::Schema(_)));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(""), "(root)");
        assert_eq!(display_path("/items/0/id"), "items.0.id");
    }

    fn json_object() -> impl Strategy<Value = String> {
        prop::collection::btree_map("[a-d]{1,2}", any::<i32>(), 0..6)
            .prop_map(|map| serde_json::to_string(&map).unwrap())
    }

    proptest! {
        #[test]
        fn prop_required_fields_score_in_unit_interval(
            response in prop_oneof![".{0,120}", json_object()],
            fields in prop::collection::vec("[a-d]{1,2}", 0..5),
        ) {
            let check = required_fields(fields.clone());
            let result = block_on(check.evaluate(&response, None)).unwrap();
            prop_assert!((0.0..=1.0).contains(&result.score));
            prop_assert_eq!(result.pass, result.score == 1.0);
            if fields.is_empty() {
                prop_assert!(result.pass);
            }
        }

        #[test]
        fn prop_json_schema_score_is_binary(response in prop_oneof![".{0,120}", json_object()]) {
            let check = json_schema(json!({
                "type": "object",
                "required": ["a"],
                "additionalProperties": { "type": "integer", "minimum": 0 }
            }));
            let result = block_on(check.evaluate(&response, None)).unwrap();
            prop_assert!(result.score == 0.0 || result.score == 1.0);
            prop_assert_eq!(result.pass, result.score == 1.0);
        }
    }
}
