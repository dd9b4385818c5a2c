//! Suite parsing from YAML/JSON.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::engine::EvaluationConfig;
use crate::evaluator::Evaluator;
use crate::guardrails::{no_hallucinated_urls, no_personal_data, on_topic, toxicity, PiiCategory};
use crate::structural::{json_schema, max_length, min_length, required_fields};
use crate::types::{EvaluationContext, Severity};

use super::schema::validate_suite_schema;

/// Errors that can occur when loading suites.
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Failed to read suite file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Suite does not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Suite schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("Invalid pattern '{name}': {source}")]
    PatternError {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Suite validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// A named regex for `no_personal_data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedPattern {
    pub name: String,
    pub pattern: String,
}

/// One evaluator entry, tagged by `type`.
///
/// Each variant mirrors the options of its factory function. `severity`
/// overrides the factory default when present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvaluatorSpec {
    MaxLength {
        limit: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
    MinLength {
        minimum: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
    RequiredFields {
        fields: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
    JsonSchema {
        schema: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
    NoPersonalData {
        #[serde(default)]
        exclude: Vec<PiiCategory>,
        #[serde(default)]
        custom_patterns: Vec<NamedPattern>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
    OnTopic {
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
    NoHallucinatedUrls {
        #[serde(default)]
        allowed_domains: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
    Toxicity {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
}

impl EvaluatorSpec {
    /// The `type` tag as written in suite files.
    pub fn kind(&self) -> &'static str {
        match self {
            EvaluatorSpec::MaxLength { .. } => "max_length",
            EvaluatorSpec::MinLength { .. } => "min_length",
            EvaluatorSpec::RequiredFields { .. } => "required_fields",
            EvaluatorSpec::JsonSchema { .. } => "json_schema",
            EvaluatorSpec::NoPersonalData { .. } => "no_personal_data",
            EvaluatorSpec::OnTopic { .. } => "on_topic",
            EvaluatorSpec::NoHallucinatedUrls { .. } => "no_hallucinated_urls",
            EvaluatorSpec::Toxicity { .. } => "toxicity",
        }
    }

    /// Instantiate the evaluator this entry describes.
    pub fn build(&self) -> Result<Arc<dyn Evaluator>, SuiteError> {
        let evaluator: Arc<dyn Evaluator> = match self {
            EvaluatorSpec::MaxLength { limit, severity } => {
                let mut e = max_length(*limit);
                if let Some(s) = severity {
                    e = e.severity(*s);
                }
                Arc::new(e)
            }
            EvaluatorSpec::MinLength { minimum, severity } => {
                let mut e = min_length(*minimum);
                if let Some(s) = severity {
                    e = e.severity(*s);
                }
                Arc::new(e)
            }
            EvaluatorSpec::RequiredFields { fields, severity } => {
                let mut e = required_fields(fields.iter().cloned());
                if let Some(s) = severity {
                    e = e.severity(*s);
                }
                Arc::new(e)
            }
            EvaluatorSpec::JsonSchema { schema, severity } => {
                let mut e = json_schema(schema.clone());
                if let Some(s) = severity {
                    e = e.severity(*s);
                }
                Arc::new(e)
            }
            EvaluatorSpec::NoPersonalData {
                exclude,
                custom_patterns,
                severity,
            } => {
                let mut e = no_personal_data();
                for category in exclude {
                    e = e.exclude(*category);
                }
                for named in custom_patterns {
                    e = e.custom_pattern(named.name.clone(), compile_pattern(named)?);
                }
                if let Some(s) = severity {
                    e = e.severity(*s);
                }
                Arc::new(e)
            }
            EvaluatorSpec::OnTopic {
                topic,
                threshold,
                severity,
            } => {
                let mut e = on_topic(topic.clone());
                if let Some(t) = threshold {
                    e = e.threshold(*t);
                }
                if let Some(s) = severity {
                    e = e.severity(*s);
                }
                Arc::new(e)
            }
            EvaluatorSpec::NoHallucinatedUrls {
                allowed_domains,
                severity,
            } => {
                let mut e =
                    no_hallucinated_urls().allowed_domains(allowed_domains.iter().cloned());
                if let Some(s) = severity {
                    e = e.severity(*s);
                }
                Arc::new(e)
            }
            EvaluatorSpec::Toxicity {
                threshold,
                severity,
            } => {
                let mut e = toxicity();
                if let Some(t) = threshold {
                    e = e.threshold(*t);
                }
                if let Some(s) = severity {
                    e = e.severity(*s);
                }
                Arc::new(e)
            }
        };

        Ok(evaluator)
    }

    /// Checks the schema cannot express.
    fn validate(&self, location: &str) -> Result<(), SuiteError> {
        match self {
            EvaluatorSpec::OnTopic {
                threshold: Some(t), ..
            }
            | EvaluatorSpec::Toxicity {
                threshold: Some(t), ..
            } if !(0.0..=1.0).contains(t) => Err(SuiteError::ValidationError(format!(
                "{}: threshold {} is outside [0, 1]",
                location, t
            ))),
            EvaluatorSpec::NoPersonalData {
                custom_patterns, ..
            } => {
                for named in custom_patterns {
                    compile_pattern(named)?;
                }
                Ok(())
            }
            EvaluatorSpec::JsonSchema { schema, .. } => jsonschema::options()
                .build(schema)
                .map(|_| ())
                .map_err(|e| {
                    SuiteError::ValidationError(format!("{}: invalid schema: {}", location, e))
                }),
            _ => Ok(()),
        }
    }
}

fn compile_pattern(named: &NamedPattern) -> Result<Regex, SuiteError> {
    Regex::new(&named.pattern).map_err(|source| SuiteError::PatternError {
        name: named.name.clone(),
        source,
    })
}

/// One response and the checks to run against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub name: String,

    /// Inline response text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Response read from disk, relative to the suite file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EvaluationContext>,

    #[serde(default)]
    pub stop_on_first_failure: bool,

    pub evaluators: Vec<EvaluatorSpec>,
}

impl TestCase {
    /// Build the engine configuration for this case.
    pub fn to_config(&self) -> Result<EvaluationConfig, SuiteError> {
        let mut config =
            EvaluationConfig::new(&self.name).stop_on_first_failure(self.stop_on_first_failure);
        if let Some(context) = &self.context {
            config = config.context(context.clone());
        }
        for spec in &self.evaluators {
            config = config.shared_evaluator(spec.build()?);
        }
        Ok(config)
    }

    /// The response text, reading `response_file` relative to `base_dir`.
    pub fn load_response(&self, base_dir: Option<&Path>) -> Result<String, SuiteError> {
        match (&self.response, &self.response_file) {
            (Some(inline), _) => Ok(inline.clone()),
            (None, Some(file)) => {
                let path = match base_dir {
                    Some(dir) if file.is_relative() => dir.join(file),
                    _ => file.clone(),
                };
                Ok(fs::read_to_string(path)?)
            }
            (None, None) => Err(SuiteError::MissingField(format!(
                "tests[{}].response",
                self.name
            ))),
        }
    }
}

/// A named collection of test cases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub tests: Vec<TestCase>,

    /// Directory of the file this suite was loaded from
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl SuiteConfig {
    /// Parse a suite from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SuiteError> {
        let document: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(document)
    }

    /// Parse a suite from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SuiteError> {
        let document: Value = serde_json::from_str(json)?;
        Self::from_value(document)
    }

    /// Parse a suite file; `.json` is read as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SuiteError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut suite = if is_json {
            Self::from_json(&contents)?
        } else {
            Self::from_yaml(&contents)?
        };
        suite.base_dir = path.parent().map(Path::to_path_buf);
        Ok(suite)
    }

    fn from_value(document: Value) -> Result<Self, SuiteError> {
        validate_suite_schema(&document)?;
        let suite: SuiteConfig = serde_json::from_value(document)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Response text for `test`, resolved against this suite's directory.
    pub fn response_for(&self, test: &TestCase) -> Result<String, SuiteError> {
        test.load_response(self.base_dir.as_deref())
    }

    /// Validate the suite structure.
    pub fn validate(&self) -> Result<(), SuiteError> {
        if self.name.trim().is_empty() {
            return Err(SuiteError::MissingField("name".to_string()));
        }

        let mut seen = HashSet::new();
        for test in &self.tests {
            if test.name.trim().is_empty() {
                return Err(SuiteError::MissingField("tests[].name".to_string()));
            }
            if !seen.insert(test.name.as_str()) {
                return Err(SuiteError::ValidationError(format!(
                    "Duplicate test name: {}",
                    test.name
                )));
            }

            match (&test.response, &test.response_file) {
                (Some(_), Some(_)) => {
                    return Err(SuiteError::ValidationError(format!(
                        "{}: set either response or response_file, not both",
                        test.name
                    )))
                }
                (None, None) => {
                    return Err(SuiteError::MissingField(format!(
                        "tests[{}].response",
                        test.name
                    )))
                }
                _ => {}
            }

            for (index, spec) in test.evaluators.iter().enumerate() {
                let location = format!("{}.evaluators[{}] ({})", test.name, index, spec.kind());
                spec.validate(&location)?;
            }
        }

        Ok(())
    }
}
