//! Personal data (PII) detection.

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use crate::error::EvaluatorError;
use crate::evaluator::Evaluator;
use crate::types::{Category, EvaluationContext, EvaluationResult, Severity};

use super::patterns::PiiCategory;

const NO_PERSONAL_DATA: &str = "no_personal_data";

/// Fails when any enabled category matches the response.
#[derive(Debug, Clone)]
pub struct NoPersonalData {
    exclude: Vec<PiiCategory>,
    custom_patterns: Vec<(String, Regex)>,
    severity: Severity,
}

/// Scan for email, phone, SSN, credit card and IP address patterns.
pub fn no_personal_data() -> NoPersonalData {
    NoPersonalData {
        exclude: Vec::new(),
        custom_patterns: Vec::new(),
        severity: Severity::Error,
    }
}

impl NoPersonalData {
    /// Skip a built-in category.
    pub fn exclude(mut self, category: PiiCategory) -> Self {
        if !self.exclude.contains(&category) {
            self.exclude.push(category);
        }
        self
    }

    /// Add a caller-defined category. Matching follows the regex's own flags.
    pub fn custom_pattern(mut self, name: impl Into<String>, pattern: Regex) -> Self {
        self.custom_patterns.push((name.into(), pattern));
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Enabled categories in scan order: built-ins first, then custom.
    fn categories(&self) -> impl Iterator<Item = (&str, &Regex)> {
        PiiCategory::ALL
            .into_iter()
            .filter(|c| !self.exclude.contains(c))
            .map(|c| (c.as_str(), c.pattern()))
            .chain(
                self.custom_patterns
                    .iter()
                    .map(|(name, regex)| (name.as_str(), regex)),
            )
    }
}

#[async_trait]
impl Evaluator for NoPersonalData {
    fn name(&self) -> Option<&str> {
        Some(NO_PERSONAL_DATA)
    }

    async fn evaluate(
        &self,
        response: &str,
        _context: Option<&EvaluationContext>,
    ) -> Result<EvaluationResult, EvaluatorError> {
        let mut detections: Vec<(String, usize)> = Vec::new();
        let mut categories_checked = 0usize;

        for (name, pattern) in self.categories() {
            categories_checked += 1;
            let count = pattern.find_iter(response).count();
            if count > 0 {
                detections.push((name.to_string(), count));
            }
        }

        let pass = detections.is_empty();
        let details = if pass {
            format!(
                "No personal data detected ({} categories checked)",
                categories_checked
            )
        } else {
            format!(
                "Personal data detected: {}",
                detections
                    .iter()
                    .map(|(name, count)| format!("{} ({})", name, count))
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };

        let detection_list: Vec<Value> = detections
            .iter()
            .map(|(name, count)| json!({ "type": name, "count": count }))
            .collect();

        Ok(
            EvaluationResult::new(NO_PERSONAL_DATA, Category::Guardrail, self.severity)
                .with_outcome(pass, if pass { 1.0 } else { 0.0 })
                .with_threshold(1.0)
                .with_details(details)
                .with_entry("detections", detection_list)
                .with_entry("categoriesChecked", categories_checked),
        )
    }
}
