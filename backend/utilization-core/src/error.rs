// src/error.rs
use thiserror::Error;

/// Failures at the edges of the engine: loading inputs and configuration.
/// The computation itself never fails.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),
    #[error("Unknown reporting timezone: {0}")]
    UnknownTimezone(String),
    #[error("Unknown reporting period: {0}")]
    InvalidPeriod(String),
    #[error("Invalid month key (expected YYYY-MM): {0}")]
    InvalidMonthKey(String),
    #[error("Unsupported input file type: {0}")]
    UnsupportedInput(String),
}
