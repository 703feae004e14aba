//! Bucket keys for the hourly and daily tables.
//!
//! Truncation uses the UTC calendar, never local time, so a bucket always
//! spans exactly 3600 or 86400 seconds regardless of daylight saving.

use time::{Duration, OffsetDateTime, Time};

/// Width of an aggregate bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketSpan {
    /// One UTC hour.
    Hour,
    /// One UTC day.
    Day,
}

impl BucketSpan {
    /// Length of the bucket in seconds.
    pub const fn seconds(self) -> i64 {
        match self {
            BucketSpan::Hour => 3_600,
            BucketSpan::Day => 86_400,
        }
    }

    /// Half-open `[start, end)` range of the bucket containing `timestamp`.
    ///
    /// The end saturates at `i64::MAX` for the last representable bucket.
    pub fn range(self, timestamp: i64) -> (i64, i64) {
        let start = bucket_key(timestamp, self);
        (start, start.saturating_add(self.seconds()))
    }
}

/// Truncate `timestamp` to the start of its UTC hour or day.
///
/// Timestamps already on a boundary map to themselves, and pre-1970
/// timestamps floor towards the earlier bucket.
///
/// # Example
///
/// ```
/// use weather_store::{BucketSpan, bucket_key};
///
/// // 2024-03-10T02:30:00Z
/// assert_eq!(bucket_key(1_710_037_800, BucketSpan::Hour), 1_710_036_000);
/// assert_eq!(bucket_key(1_710_037_800, BucketSpan::Day), 1_710_028_800);
/// ```
pub fn bucket_key(timestamp: i64, span: BucketSpan) -> i64 {
    match OffsetDateTime::from_unix_timestamp(timestamp) {
        Ok(dt) => {
            let truncated = match span {
                BucketSpan::Hour => {
                    dt.replace_time(Time::MIDNIGHT) + Duration::hours(i64::from(dt.hour()))
                }
                BucketSpan::Day => dt.replace_time(Time::MIDNIGHT),
            };
            truncated.unix_timestamp()
        }
        // Outside the calendar range; UTC has no offsets to honour. The floor
        // of the lowest bucket is below i64::MIN, so it saturates there.
        Err(_) => timestamp
            .div_euclid(span.seconds())
            .saturating_mul(span.seconds()),
    }
}
