//! Report rendering.
//!
//! Reporters only read an [`EvaluationReport`]; they have no influence on
//! scoring.

pub mod console;
pub mod json;

use serde::{Deserialize, Serialize};

use crate::types::EvaluationReport;

/// Output format for rendered reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Fixed-width table for terminals
    #[default]
    Console,
    /// Pretty-printed JSON
    Json,
}

impl ReportFormat {
    /// Render a report in this format.
    pub fn render(&self, report: &EvaluationReport) -> Result<String, serde_json::Error> {
        match self {
            ReportFormat::Console => Ok(console::render(report)),
            ReportFormat::Json => json::to_json_pretty(report),
        }
    }
}
