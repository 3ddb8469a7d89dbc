//! Error types for record loading.

use crate::validate::Violation;
use thiserror::Error;

/// Failure to turn JSON text into a [`ClassDoc`](crate::ClassDoc).
#[derive(Debug, Error)]
pub enum ModelError {
    /// The text is not well-formed JSON, or typed deserialization failed.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON is well-formed but violates the record schema.
    #[error("invalid record:\n{}", list_violations(.0))]
    Invalid(Vec<Violation>),
}

impl ModelError {
    /// Field paths of all schema violations (empty for malformed JSON).
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::Json(_) => Vec::new(),
            Self::Invalid(violations) => violations.iter().map(|v| v.path.as_str()).collect(),
        }
    }
}

fn list_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Failure to pull JSON payloads out of a webpack chunk.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON.parse payload found")]
    NoPayload,

    #[error("unterminated string literal starting at byte {offset}")]
    UnterminatedString { offset: usize },

    #[error("invalid escape sequence at byte {offset}: {reason}")]
    InvalidEscape { offset: usize, reason: &'static str },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
