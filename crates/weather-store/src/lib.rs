//! Time-series storage and rollups for weather station samples.
//!
//! This crate keeps temperature/humidity samples in SQLite together with
//! hourly and daily rollups that are maintained on every write, and answers
//! range queries at a granularity chosen from the length of the range.
//!
//! # Features
//!
//! - Raw, hourly and daily tables updated in a single transaction per write
//! - Incremental mean/min/max on insert, exact recomputation on delete
//! - Automatic raw/hour/day selection with configurable thresholds
//! - Best-effort diagnostic event log
//! - CSV import/export and a one-time reshape of version 1 databases
//!
//! # Example
//!
//! ```
//! use weather_store::Store;
//! use weather_types::{Granularity, WeatherRows};
//!
//! let mut store = Store::open_in_memory()?;
//! store.save_weather_data(Some(1000), 20.0, 50.0)?;
//!
//! let data = store.get_weather_data(1000, 1001, Some(Granularity::Raw))?;
//! assert_eq!(data.rows.len(), 1);
//!
//! // Auto-selected granularity for a two-month range
//! let data = store.get_weather_data(0, 60 * 86_400, None)?;
//! assert_eq!(data.granularity, Granularity::Day);
//! assert!(matches!(data.rows, WeatherRows::Aggregated(_)));
//! # Ok::<(), weather_store::Error>(())
//! ```

mod aggregate;
mod bucket;
mod error;
mod event_log;
mod models;
mod query;
mod schema;
mod store;

pub use aggregate::AggregateTable;
pub use bucket::{BucketSpan, bucket_key};
pub use error::{Error, Result};
pub use event_log::LogQuery;
pub use models::{ImportResult, LogEntry, StoreStats};
pub use query::{QueryThresholds, ThresholdError, resolve_granularity};
pub use schema::SCHEMA_VERSION;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/weather/data.db`
/// - macOS: `~/Library/Application Support/weather/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\weather\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("weather")
        .join("data.db")
}
