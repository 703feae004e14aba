//! Error types for input validation in weather-types.

use thiserror::Error;

/// Errors that can occur when parsing untrusted weather input.
///
/// Every variant describes an invalid input that was rejected before it
/// could reach storage.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Timestamp is neither epoch seconds nor an RFC 3339 / `YYYY-MM-DD` date.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A temperature or humidity value is not a finite number.
    #[error("Invalid {field}: {value}")]
    InvalidMeasurement {
        /// Which measurement was rejected.
        field: &'static str,
        /// The offending raw input.
        value: String,
    },

    /// Probe output did not have the `temperature;humidity` shape.
    #[error("Invalid probe output: {0}")]
    InvalidProbeLine(String),

    /// Unknown granularity name.
    #[error("Unknown granularity: {0} (expected raw, hour or day)")]
    UnknownGranularity(String),

    /// Unknown log severity name or level.
    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),
}

/// Result type alias using weather-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
