//! Error types for the duty engine

use thiserror::Error;

/// Errors surfaced by input loading, schedule ingestion and configuration.
///
/// Rate parsing and schedule lookup never produce these: an unparseable rate
/// is Free and a failed lookup is "not found".
#[derive(Error, Debug)]
pub enum DutyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Schedule store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Malformed shipment entry: {0}")]
    MalformedEntry(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Schedule store lock poisoned: {0}")]
    Lock(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DutyError>;
