//! Range queries and automatic granularity selection.
//!
//! A dashboard asks for `[start, end)` and usually leaves the granularity to
//! the store. Short spans are answered from the raw table, longer ones from
//! the hourly or daily rollups so that the row count stays manageable.
//!
//! # Example
//!
//! ```
//! use weather_store::{QueryThresholds, resolve_granularity};
//! use weather_types::Granularity;
//!
//! let thresholds = QueryThresholds::default();
//!
//! // One week exactly is still raw; one second more switches to hourly.
//! assert_eq!(resolve_granularity(0, 604_800, None, &thresholds), Granularity::Raw);
//! assert_eq!(resolve_granularity(0, 604_801, None, &thresholds), Granularity::Hour);
//!
//! // An explicit request always wins.
//! assert_eq!(
//!     resolve_granularity(0, 10, Some(Granularity::Day), &thresholds),
//!     Granularity::Day
//! );
//! ```

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use weather_types::{Aggregate, Granularity, Sample};

use crate::aggregate::{AGGREGATE_COLUMNS, AggregateTable, aggregate_from_row};
use crate::error::Result;

/// Span thresholds for automatic granularity selection.
///
/// A span strictly greater than `hour_threshold_secs` is served hourly, one
/// strictly greater than `day_threshold_secs` daily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryThresholds {
    /// Spans above this use the hourly table (default: 7 days).
    pub hour_threshold_secs: i64,
    /// Spans above this use the daily table (default: 31 days).
    pub day_threshold_secs: i64,
}

impl QueryThresholds {
    /// Seven days.
    pub const DEFAULT_HOUR_THRESHOLD: i64 = 7 * 86_400;
    /// Thirty-one days.
    pub const DEFAULT_DAY_THRESHOLD: i64 = 31 * 86_400;

    /// Create thresholds from explicit values.
    pub fn new(hour_threshold_secs: i64, day_threshold_secs: i64) -> Self {
        Self {
            hour_threshold_secs,
            day_threshold_secs,
        }
    }

    /// Check that both thresholds are positive and ordered.
    pub fn validate(&self) -> std::result::Result<(), ThresholdError> {
        if self.hour_threshold_secs <= 0 {
            return Err(ThresholdError::NonPositiveHour(self.hour_threshold_secs));
        }
        if self.day_threshold_secs <= self.hour_threshold_secs {
            return Err(ThresholdError::Unordered {
                hour: self.hour_threshold_secs,
                day: self.day_threshold_secs,
            });
        }
        Ok(())
    }
}

/// Why a pair of [`QueryThresholds`] was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ThresholdError {
    #[error("hour threshold must be positive (got {0})")]
    NonPositiveHour(i64),
    #[error("day threshold ({day}) must be greater than hour threshold ({hour})")]
    Unordered { hour: i64, day: i64 },
}

impl ThresholdError {
    /// Configuration key of the offending threshold.
    pub fn field(&self) -> &'static str {
        match self {
            ThresholdError::NonPositiveHour(_) => "query.hour_threshold_secs",
            ThresholdError::Unordered { .. } => "query.day_threshold_secs",
        }
    }
}

impl Default for QueryThresholds {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOUR_THRESHOLD, Self::DEFAULT_DAY_THRESHOLD)
    }
}

/// Pick the granularity for `[start, end)`.
///
/// `requested` wins when present; otherwise the span is compared against the
/// thresholds.
pub fn resolve_granularity(
    start: i64,
    end: i64,
    requested: Option<Granularity>,
    thresholds: &QueryThresholds,
) -> Granularity {
    if let Some(granularity) = requested {
        return granularity;
    }

    let span = end.saturating_sub(start);
    if span > thresholds.day_threshold_secs {
        Granularity::Day
    } else if span > thresholds.hour_threshold_secs {
        Granularity::Hour
    } else {
        Granularity::Raw
    }
}

/// Raw samples with `timestamp` in `[start, end)`, ascending.
pub(crate) fn raw_range(conn: &Connection, start: i64, end: i64) -> Result<Vec<Sample>> {
    debug!("Reading raw_data in [{}, {})", start, end);

    let mut stmt = conn.prepare_cached(
        "SELECT timestamp, temperature, humidity FROM raw_data
         WHERE timestamp >= ?1 AND timestamp < ?2 ORDER BY timestamp ASC",
    )?;

    let samples = stmt
        .query_map([start, end], |row| {
            Ok(Sample {
                timestamp: row.get(0)?,
                temperature: row.get(1)?,
                humidity: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(samples)
}

/// Rollup rows with bucket start in `[start, end)`, ascending.
pub(crate) fn aggregate_range(
    conn: &Connection,
    table: AggregateTable,
    start: i64,
    end: i64,
) -> Result<Vec<Aggregate>> {
    debug!("Reading {} in [{}, {})", table.name(), start, end);

    let sql = format!(
        "SELECT {} FROM {} WHERE timestamp >= ?1 AND timestamp < ?2 ORDER BY timestamp ASC",
        AGGREGATE_COLUMNS,
        table.name()
    );

    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt
        .query_map([start, end], aggregate_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
