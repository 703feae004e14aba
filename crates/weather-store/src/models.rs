//! Data models for stored data.

use serde::{Deserialize, Serialize};

use weather_types::Severity;

/// An entry in the diagnostic event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Database row ID.
    pub id: i64,
    /// When the event was logged (seconds since the Unix epoch, UTC).
    pub timestamp: i64,
    /// Event severity.
    pub severity: Severity,
    /// Free-form message.
    pub message: String,
}

/// Row counts and coverage of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Rows in the raw table.
    pub raw_samples: u64,
    /// Rows in the hourly table.
    pub hourly_buckets: u64,
    /// Rows in the daily table.
    pub daily_buckets: u64,
    /// Rows in the event log.
    pub log_entries: u64,
    /// Oldest and newest raw timestamp, if any samples exist.
    pub time_range: Option<(i64, i64)>,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    /// Data rows read from the input.
    pub total: usize,
    /// Rows saved.
    pub imported: usize,
    /// Rows skipped because their timestamp was already stored.
    pub skipped: usize,
    /// Rows rejected, with their line number and reason.
    pub errors: Vec<String>,
}
