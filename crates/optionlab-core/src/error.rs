use rust_decimal::Decimal;
use thiserror::Error;

use crate::strategy::validation::ValidationIssue;

#[derive(Debug, Error)]
pub enum OptionLabError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid strategy ({} issue(s)): {}", .0.len(), summarize_issues(.0))]
    InvalidStrategy(Vec<ValidationIssue>),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("CSV error: {0}")]
    CsvError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

fn summarize_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<serde_json::Error> for OptionLabError {
    fn from(e: serde_json::Error) -> Self {
        OptionLabError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "export")]
impl From<csv::Error> for OptionLabError {
    fn from(e: csv::Error) -> Self {
        OptionLabError::CsvError(e.to_string())
    }
}
