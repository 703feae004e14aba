//! Core types for weather station data.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// A single temperature/humidity reading as stored in the raw table.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Seconds since the Unix epoch, UTC.
    pub timestamp: i64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

impl Sample {
    /// Create a new sample.
    #[must_use]
    pub fn new(timestamp: i64, temperature: f64, humidity: f64) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
        }
    }

    /// The sample time as a UTC date-time, if representable.
    #[must_use]
    pub fn datetime(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.timestamp).ok()
    }
}

/// Statistics over all raw samples that share one hour or day bucket.
///
/// The mean is maintained incrementally (`mean += (value - mean) / n`), so an
/// aggregate can absorb new samples without re-reading its bucket. Min and
/// max cannot be "un-applied", which is why removing a sample means folding
/// the remaining ones from scratch with [`Aggregate::fold`].
///
/// # Example
///
/// ```
/// use weather_types::{Aggregate, Sample};
///
/// let samples = [
///     Sample::new(3600, 10.0, 40.0),
///     Sample::new(3660, 30.0, 60.0),
///     Sample::new(3720, 20.0, 50.0),
/// ];
/// let agg = Aggregate::fold(3600, &samples).unwrap();
///
/// assert_eq!(agg.number_values, 3);
/// assert_eq!(agg.min_temperature, 10.0);
/// assert_eq!(agg.max_temperature, 30.0);
/// assert!((agg.temperature - 20.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aggregate {
    /// Bucket start, seconds since the Unix epoch, UTC.
    pub timestamp: i64,
    /// Mean temperature.
    pub temperature: f64,
    /// Mean humidity.
    pub humidity: f64,
    /// Lowest temperature in the bucket.
    pub min_temperature: f64,
    /// Highest temperature in the bucket.
    pub max_temperature: f64,
    /// Lowest humidity in the bucket.
    pub min_humidity: f64,
    /// Highest humidity in the bucket.
    pub max_humidity: f64,
    /// Number of raw samples folded into this bucket.
    pub number_values: u32,
}

impl Aggregate {
    /// Start a bucket from its first sample.
    #[must_use]
    pub fn first(bucket: i64, temperature: f64, humidity: f64) -> Self {
        Self {
            timestamp: bucket,
            temperature,
            humidity,
            min_temperature: temperature,
            max_temperature: temperature,
            min_humidity: humidity,
            max_humidity: humidity,
            number_values: 1,
        }
    }

    /// Fold one more sample into the bucket.
    pub fn push(&mut self, temperature: f64, humidity: f64) {
        let n = f64::from(self.number_values + 1);

        self.temperature += (temperature - self.temperature) / n;
        self.humidity += (humidity - self.humidity) / n;

        self.min_temperature = self.min_temperature.min(temperature);
        self.max_temperature = self.max_temperature.max(temperature);
        self.min_humidity = self.min_humidity.min(humidity);
        self.max_humidity = self.max_humidity.max(humidity);

        // Rounding can push the mean a ulp past the extremes.
        self.temperature = self
            .temperature
            .clamp(self.min_temperature, self.max_temperature);
        self.humidity = self.humidity.clamp(self.min_humidity, self.max_humidity);

        self.number_values += 1;
    }

    /// Fold a sequence of samples into a fresh aggregate for `bucket`.
    ///
    /// Returns `None` for an empty sequence; empty buckets have no row.
    pub fn fold<'a, I>(bucket: i64, samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        let mut iter = samples.into_iter();
        let first = iter.next()?;
        let mut agg = Self::first(bucket, first.temperature, first.humidity);
        for sample in iter {
            agg.push(sample.temperature, sample.humidity);
        }
        Some(agg)
    }

    /// The raw view of this aggregate (bucket start and means).
    #[must_use]
    pub fn as_sample(&self) -> Sample {
        Sample::new(self.timestamp, self.temperature, self.humidity)
    }
}

/// Resolution of rows returned by a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Granularity {
    /// Every stored sample.
    Raw,
    /// One row per UTC hour.
    Hour,
    /// One row per UTC day.
    Day,
}

impl Granularity {
    /// Parse a granularity request where anything but an explicit
    /// `raw`, `hour` or `day` means "choose automatically".
    ///
    /// # Examples
    ///
    /// ```
    /// use weather_types::Granularity;
    ///
    /// assert_eq!(Granularity::parse_request("hour"), Some(Granularity::Hour));
    /// assert_eq!(Granularity::parse_request("auto"), None);
    /// assert_eq!(Granularity::parse_request(""), None);
    /// ```
    #[must_use]
    pub fn parse_request(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Lowercase name as used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Raw => "raw",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
        }
    }
}

impl FromStr for Granularity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Granularity::Raw),
            "hour" | "hourly" => Ok(Granularity::Hour),
            "day" | "daily" => Ok(Granularity::Day),
            _ => Err(ParseError::UnknownGranularity(s.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an event log entry, ordered like syslog.
///
/// Lower values are more severe, so `Severity::Error < Severity::Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[repr(u8)]
pub enum Severity {
    /// System is unusable.
    Emergency = 0,
    /// Action must be taken immediately.
    Alert = 1,
    /// Critical conditions.
    Critical = 2,
    /// Error conditions.
    Error = 3,
    /// Warning conditions.
    Warning = 4,
    /// Normal but significant condition.
    Notice = 5,
    /// Informational messages.
    Info = 6,
    /// Debug-level messages.
    Debug = 7,
}

impl Severity {
    /// All levels, most severe first.
    pub const ALL: [Severity; 8] = [
        Severity::Emergency,
        Severity::Alert,
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Notice,
        Severity::Info,
        Severity::Debug,
    ];

    /// Uppercase name as stored and displayed.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Emergency => "EMERGENCY",
            Severity::Alert => "ALERT",
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Notice => "NOTICE",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = ParseError;

    /// Convert a numeric level (0 = EMERGENCY .. 7 = DEBUG).
    ///
    /// # Examples
    ///
    /// ```
    /// use weather_types::Severity;
    ///
    /// assert_eq!(Severity::try_from(3), Ok(Severity::Error));
    /// assert!(Severity::try_from(8).is_err());
    /// ```
    fn try_from(value: u8) -> Result<Self, ParseError> {
        Severity::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| ParseError::UnknownSeverity(value.to_string()))
    }
}

impl FromStr for Severity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(level) = trimmed.parse::<u8>() {
            return Severity::try_from(level);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "EMERGENCY" | "EMERG" => Ok(Severity::Emergency),
            "ALERT" => Ok(Severity::Alert),
            "CRITICAL" | "CRIT" => Ok(Severity::Critical),
            "ERROR" | "ERR" => Ok(Severity::Error),
            "WARNING" | "WARN" => Ok(Severity::Warning),
            "NOTICE" => Ok(Severity::Notice),
            "INFO" => Ok(Severity::Info),
            "DEBUG" => Ok(Severity::Debug),
            _ => Err(ParseError::UnknownSeverity(s.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows returned by a range query.
///
/// Raw rows carry only the reading itself; hourly and daily rows add the
/// bucket extremes and sample count.
///
/// Serialized untagged. Aggregated rows are tried first when reading back,
/// since every aggregate row is also a valid sample with extra fields.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum WeatherRows {
    /// Rows from the hourly or daily table.
    Aggregated(Vec<Aggregate>),
    /// Rows from the raw table.
    Raw(Vec<Sample>),
}

impl WeatherRows {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            WeatherRows::Raw(rows) => rows.len(),
            WeatherRows::Aggregated(rows) => rows.len(),
        }
    }

    /// Whether the query matched no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamps of all rows, ascending.
    #[must_use]
    pub fn timestamps(&self) -> Vec<i64> {
        match self {
            WeatherRows::Raw(rows) => rows.iter().map(|r| r.timestamp).collect(),
            WeatherRows::Aggregated(rows) => rows.iter().map(|r| r.timestamp).collect(),
        }
    }
}

/// Result of a range query: the resolved range, granularity and rows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "WeatherDataWire"))]
pub struct WeatherData {
    /// Inclusive start of the range.
    pub start: i64,
    /// Exclusive end of the range.
    pub end: i64,
    /// Granularity the rows were read at.
    pub granularity: Granularity,
    /// Matching rows, ascending by timestamp.
    pub rows: WeatherRows,
}

/// Deserialized form of [`WeatherData`]. An empty row list carries no shape
/// of its own, so its variant follows the granularity.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct WeatherDataWire {
    start: i64,
    end: i64,
    granularity: Granularity,
    rows: WeatherRows,
}

#[cfg(feature = "serde")]
impl From<WeatherDataWire> for WeatherData {
    fn from(wire: WeatherDataWire) -> Self {
        let rows = match (wire.rows, wire.granularity) {
            (rows, _) if !rows.is_empty() => rows,
            (_, Granularity::Raw) => WeatherRows::Raw(Vec::new()),
            (_, Granularity::Hour | Granularity::Day) => WeatherRows::Aggregated(Vec::new()),
        };
        Self {
            start: wire.start,
            end: wire.end,
            granularity: wire.granularity,
            rows,
        }
    }
}
