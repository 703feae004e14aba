//! Maintenance of the hourly and daily rollup tables.
//!
//! Adding a sample updates its bucket in place with the incremental
//! mean/min/max from [`Aggregate::push`]. Removing one cannot be undone
//! incrementally (a minimum cannot be "un-applied"), so the bucket row is
//! deleted and refolded from the raw samples that remain.
//!
//! All functions take a plain [`Connection`]; callers run them inside the
//! transaction that also touches the raw table.

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use weather_types::{Aggregate, Granularity, Sample};

use crate::bucket::{BucketSpan, bucket_key};
use crate::error::Result;
use crate::query;

/// One of the two rollup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateTable {
    /// `hourly_data`, keyed by UTC hour start.
    Hourly,
    /// `daily_data`, keyed by UTC midnight.
    Daily,
}

impl AggregateTable {
    /// Both tables, finest first.
    pub const ALL: [AggregateTable; 2] = [AggregateTable::Hourly, AggregateTable::Daily];

    /// SQL table name.
    pub const fn name(self) -> &'static str {
        match self {
            AggregateTable::Hourly => "hourly_data",
            AggregateTable::Daily => "daily_data",
        }
    }

    /// Bucket width.
    pub const fn span(self) -> BucketSpan {
        match self {
            AggregateTable::Hourly => BucketSpan::Hour,
            AggregateTable::Daily => BucketSpan::Day,
        }
    }

    /// The rollup table serving a granularity, if it is not raw.
    pub fn for_granularity(granularity: Granularity) -> Option<Self> {
        match granularity {
            Granularity::Raw => None,
            Granularity::Hour => Some(AggregateTable::Hourly),
            Granularity::Day => Some(AggregateTable::Daily),
        }
    }
}

pub(crate) const AGGREGATE_COLUMNS: &str = "timestamp, temperature, humidity, \
     min_temperature, max_temperature, min_humidity, max_humidity, number_values";

pub(crate) fn aggregate_from_row(row: &Row<'_>) -> rusqlite::Result<Aggregate> {
    Ok(Aggregate {
        timestamp: row.get(0)?,
        temperature: row.get(1)?,
        humidity: row.get(2)?,
        min_temperature: row.get(3)?,
        max_temperature: row.get(4)?,
        min_humidity: row.get(5)?,
        max_humidity: row.get(6)?,
        number_values: row.get(7)?,
    })
}

/// Fetch the rollup row for the bucket starting at `key`.
pub fn get(conn: &Connection, table: AggregateTable, key: i64) -> Result<Option<Aggregate>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE timestamp = ?",
        AGGREGATE_COLUMNS,
        table.name()
    );
    let agg = conn
        .query_row(&sql, [key], aggregate_from_row)
        .optional()?;
    Ok(agg)
}

fn insert(conn: &Connection, table: AggregateTable, agg: &Aggregate) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        table.name(),
        AGGREGATE_COLUMNS
    );
    conn.execute(
        &sql,
        params![
            agg.timestamp,
            agg.temperature,
            agg.humidity,
            agg.min_temperature,
            agg.max_temperature,
            agg.min_humidity,
            agg.max_humidity,
            agg.number_values,
        ],
    )?;
    Ok(())
}

fn update(conn: &Connection, table: AggregateTable, agg: &Aggregate) -> Result<()> {
    let sql = format!(
        "UPDATE {} SET
            temperature = ?2,
            humidity = ?3,
            min_temperature = ?4,
            max_temperature = ?5,
            min_humidity = ?6,
            max_humidity = ?7,
            number_values = ?8
         WHERE timestamp = ?1",
        table.name()
    );
    conn.execute(
        &sql,
        params![
            agg.timestamp,
            agg.temperature,
            agg.humidity,
            agg.min_temperature,
            agg.max_temperature,
            agg.min_humidity,
            agg.max_humidity,
            agg.number_values,
        ],
    )?;
    Ok(())
}

/// Fold one new sample into its bucket, creating the row on first use.
pub fn add_sample(
    conn: &Connection,
    table: AggregateTable,
    timestamp: i64,
    temperature: f64,
    humidity: f64,
) -> Result<Aggregate> {
    let key = bucket_key(timestamp, table.span());

    match get(conn, table, key)? {
        Some(mut agg) => {
            agg.push(temperature, humidity);
            update(conn, table, &agg)?;
            Ok(agg)
        }
        None => {
            let agg = Aggregate::first(key, temperature, humidity);
            insert(conn, table, &agg)?;
            Ok(agg)
        }
    }
}

/// Recompute the bucket containing `timestamp` from the remaining raw samples.
///
/// The raw sample must already be gone. Returns the new row, or `None` when
/// the bucket is now empty and therefore has no row.
pub fn remove_sample(
    conn: &Connection,
    table: AggregateTable,
    timestamp: i64,
) -> Result<Option<Aggregate>> {
    let (start, end) = table.span().range(timestamp);

    let sql = format!("DELETE FROM {} WHERE timestamp = ?", table.name());
    conn.execute(&sql, [start])?;

    let remaining = query::raw_range(conn, start, end)?;
    let agg = Aggregate::fold(start, &remaining);

    match agg {
        Some(ref agg) => {
            insert(conn, table, agg)?;
            debug!(
                "Recomputed {} bucket {} from {} samples",
                table.name(),
                start,
                agg.number_values
            );
        }
        None => debug!("{} bucket {} is now empty", table.name(), start),
    }

    Ok(agg)
}

/// Discard a rollup table and refold it from every raw sample.
///
/// Returns the number of buckets written.
pub fn rebuild(conn: &Connection, table: AggregateTable) -> Result<usize> {
    conn.execute(&format!("DELETE FROM {}", table.name()), [])?;

    let mut stmt =
        conn.prepare("SELECT timestamp, temperature, humidity FROM raw_data ORDER BY timestamp")?;
    let mut rows = stmt.query([])?;

    let mut current: Option<Aggregate> = None;
    let mut written = 0;

    while let Some(row) = rows.next()? {
        let sample = Sample::new(row.get(0)?, row.get(1)?, row.get(2)?);
        let key = bucket_key(sample.timestamp, table.span());

        match current {
            Some(ref mut agg) if agg.timestamp == key => {
                agg.push(sample.temperature, sample.humidity);
            }
            _ => {
                if let Some(done) = current.take() {
                    insert(conn, table, &done)?;
                    written += 1;
                }
                current = Some(Aggregate::first(key, sample.temperature, sample.humidity));
            }
        }
    }

    if let Some(done) = current {
        insert(conn, table, &done)?;
        written += 1;
    }

    debug!("Rebuilt {} with {} buckets", table.name(), written);
    Ok(written)
}
