//! Reasons a model answer is rejected.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ScoringError {
    #[error("no JSON object found in model output")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("missing or invalid field: {0}")]
    MissingField(&'static str),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: String, value: f64 },

    #[error("invalid factor at index {index}: {reason}")]
    InvalidFactor { index: usize, reason: String },
}
