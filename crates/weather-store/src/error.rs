//! Error types for weather-store.

use std::path::PathBuf;

use weather_types::ParseError;

/// Result type for weather-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in weather-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Storage engine failure (I/O, constraint violation, locking).
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Input rejected before any transaction began.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ParseError),

    /// Query range whose end precedes its start.
    #[error("Invalid range: end {end} is before start {start}")]
    InvalidRange { start: i64, end: i64 },

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// CSV import/export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from the storage engine itself.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Database(_))
    }

    /// Whether the caller supplied invalid input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::InvalidRange { .. })
    }
}
