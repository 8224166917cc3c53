//! Error types for the normalization and analytics pipeline.
//!
//! Normalization problems (malformed cells, blocks without a `Year` column)
//! never show up here: they are absorbed and counted in
//! [`crate::normalize::NormalizeReport`]. Only precondition violations and
//! I/O failures are surfaced to the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid year pair: both years are {0}; select two different years")]
    InvalidYearPair(i32),

    #[error("Invalid marker pattern {pattern:?}: {source}")]
    InvalidMarkerPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown sector: {0}")]
    UnknownSector(String),

    #[error("No consumption records could be parsed from {0}")]
    NoRecords(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
