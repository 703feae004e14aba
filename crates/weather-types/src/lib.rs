//! Platform-agnostic types for temperature/humidity weather stations.
//!
//! This crate provides the values shared by the storage engine and its
//! callers (probe ingestion, the command line, the dashboard transport).
//!
//! # Features
//!
//! - Raw samples and hour/day aggregates with incremental mean/min/max
//! - Query granularity and event log severity
//! - Parse-and-validate helpers for timestamps, measurements and probe output
//!
//! # Example
//!
//! ```
//! use weather_types::{Aggregate, Granularity, ProbeReading};
//!
//! let reading = ProbeReading::parse("21.4;47.9")?;
//! let mut agg = Aggregate::first(3600, reading.temperature, reading.humidity);
//! agg.push(22.0, 50.0);
//!
//! assert_eq!(agg.number_values, 2);
//! assert_eq!("hour".parse::<Granularity>()?, Granularity::Hour);
//! # Ok::<(), weather_types::ParseError>(())
//! ```

pub mod error;
pub mod input;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use input::{
    ProbeReading, SampleInput, check_measurement, check_timestamp, parse_measurement,
    parse_timestamp,
};
pub use types::{Aggregate, Granularity, Sample, Severity, WeatherData, WeatherRows};
