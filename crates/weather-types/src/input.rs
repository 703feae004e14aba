//! Parse-and-validate step for untrusted input.
//!
//! Timestamps, temperatures and humidities arrive as text from the probe
//! reader, CSV imports and the command line. Everything is checked here so
//! that only finite numbers and valid timestamps ever reach storage.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::{ParseError, ParseResult};
use crate::types::Sample;

/// Parse a timestamp given as epoch seconds, RFC 3339, or `YYYY-MM-DD`
/// (midnight UTC).
///
/// # Examples
///
/// ```
/// use weather_types::parse_timestamp;
///
/// assert_eq!(parse_timestamp("1000").unwrap(), 1000);
/// assert_eq!(parse_timestamp("1970-01-02").unwrap(), 86_400);
/// assert_eq!(parse_timestamp("1970-01-01T01:00:00Z").unwrap(), 3_600);
/// assert!(parse_timestamp("yesterday").is_err());
/// ```
pub fn parse_timestamp(s: &str) -> ParseResult<i64> {
    let s = s.trim();

    if let Ok(ts) = s.parse::<i64>() {
        return check_timestamp(ts);
    }

    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(dt.unix_timestamp());
    }

    let format = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(s, &format) {
        return Ok(date.midnight().assume_utc().unix_timestamp());
    }

    Err(ParseError::InvalidTimestamp(s.to_string()))
}

/// Reject timestamps that do not name a UTC calendar second.
///
/// Bucket arithmetic relies on every stored timestamp being representable
/// as a date-time (years -9999 to 9999).
///
/// # Examples
///
/// ```
/// use weather_types::check_timestamp;
///
/// assert_eq!(check_timestamp(1_710_037_800), Ok(1_710_037_800));
/// assert!(check_timestamp(i64::MAX).is_err());
/// ```
pub fn check_timestamp(timestamp: i64) -> ParseResult<i64> {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map(|_| timestamp)
        .map_err(|_| ParseError::InvalidTimestamp(timestamp.to_string()))
}

/// Parse a measurement, rejecting anything that is not a finite number.
pub fn parse_measurement(field: &'static str, s: &str) -> ParseResult<f64> {
    let value = s
        .trim()
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidMeasurement {
            field,
            value: s.to_string(),
        })?;
    check_measurement(field, value)
}

/// Reject NaN and infinite measurements.
pub fn check_measurement(field: &'static str, value: f64) -> ParseResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseError::InvalidMeasurement {
            field,
            value: value.to_string(),
        })
    }
}

/// A validated sample whose timestamp may still be "now".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleInput {
    /// Explicit timestamp, or `None` to use the time of saving.
    pub timestamp: Option<i64>,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

impl SampleInput {
    /// Validate already-numeric values.
    pub fn new(timestamp: Option<i64>, temperature: f64, humidity: f64) -> ParseResult<Self> {
        Ok(Self {
            timestamp: timestamp.map(check_timestamp).transpose()?,
            temperature: check_measurement("temperature", temperature)?,
            humidity: check_measurement("humidity", humidity)?,
        })
    }

    /// Parse and validate textual input.
    ///
    /// An absent or empty timestamp means "now".
    ///
    /// # Examples
    ///
    /// ```
    /// use weather_types::SampleInput;
    ///
    /// let input = SampleInput::parse(Some("1000"), "20.5", "48").unwrap();
    /// assert_eq!(input.timestamp, Some(1000));
    /// assert_eq!(input.temperature, 20.5);
    ///
    /// assert!(SampleInput::parse(None, "warm", "48").is_err());
    /// ```
    pub fn parse(timestamp: Option<&str>, temperature: &str, humidity: &str) -> ParseResult<Self> {
        let timestamp = match timestamp.map(str::trim) {
            Some(ts) if !ts.is_empty() => Some(parse_timestamp(ts)?),
            _ => None,
        };
        Ok(Self {
            timestamp,
            temperature: parse_measurement("temperature", temperature)?,
            humidity: parse_measurement("humidity", humidity)?,
        })
    }

    /// Resolve the timestamp against `now`.
    #[must_use]
    pub fn at(&self, now: i64) -> Sample {
        Sample::new(
            self.timestamp.unwrap_or(now),
            self.temperature,
            self.humidity,
        )
    }
}

/// One successful reading printed by the DHT probe reader.
///
/// The reader prints `"<temperature>;<humidity>"` (for example `"21.4;47.9"`)
/// on success. DHT11 probes print whole numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeReading {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

impl ProbeReading {
    /// Parse one line of probe output.
    ///
    /// # Examples
    ///
    /// ```
    /// use weather_types::ProbeReading;
    ///
    /// let reading = ProbeReading::parse("21.4;47.9").unwrap();
    /// assert_eq!(reading.temperature, 21.4);
    /// assert_eq!(reading.humidity, 47.9);
    ///
    /// assert!(ProbeReading::parse("Data (40): 0x2 0x8c").is_err());
    /// ```
    pub fn parse(line: &str) -> ParseResult<Self> {
        let line = line.trim();
        let (temperature, humidity) = line
            .split_once(';')
            .ok_or_else(|| ParseError::InvalidProbeLine(line.to_string()))?;

        Ok(Self {
            temperature: parse_measurement("temperature", temperature)?,
            humidity: parse_measurement("humidity", humidity)?,
        })
    }

    /// Convert into a sample input stamped at save time.
    #[must_use]
    pub fn into_input(self, timestamp: Option<i64>) -> SampleInput {
        SampleInput {
            timestamp,
            temperature: self.temperature,
            humidity: self.humidity,
        }
    }
}
