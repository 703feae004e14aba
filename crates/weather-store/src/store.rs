//! Main store implementation.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use time::OffsetDateTime;
use tracing::{debug, info};

use weather_types::{
    Aggregate, Granularity, Sample, SampleInput, Severity, WeatherData, WeatherRows,
    parse_timestamp,
};

use crate::aggregate::{self, AggregateTable};
use crate::error::{Error, Result};
use crate::event_log::{self, LogQuery};
use crate::models::{ImportResult, LogEntry, StoreStats};
use crate::query::{self, QueryThresholds, resolve_granularity};
use crate::schema;

/// How long a connection waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based store for weather samples and their hourly/daily rollups.
///
/// Writes take `&mut self`: a store handle has exactly one writer. Readers
/// that must run alongside ingestion open their own handle on the same file
/// and see each write transaction either completely or not at all.
pub struct Store {
    conn: Connection,
    thresholds: QueryThresholds,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        // WAL lets readers on other handles proceed during a write transaction
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self {
            conn,
            thresholds: QueryThresholds::default(),
        })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            thresholds: QueryThresholds::default(),
        })
    }

    /// Use custom thresholds for automatic granularity selection.
    pub fn with_thresholds(mut self, thresholds: QueryThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Thresholds used for automatic granularity selection.
    pub fn thresholds(&self) -> &QueryThresholds {
        &self.thresholds
    }

    /// Run `f` in one transaction; on failure, best-effort log `what`.
    fn write<T, F>(&mut self, what: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let result = run_transaction(&mut self.conn, f);

        if let Err(ref e) = result {
            event_log::append_best_effort(
                &self.conn,
                Severity::Error,
                &format!("Failed to {}: {}", what, e),
            );
        }

        result
    }
}

fn run_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction<'_>) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Insert the raw row and fold it into both rollups.
fn save_in(tx: &Transaction<'_>, sample: &Sample) -> Result<()> {
    tx.execute(
        "INSERT INTO raw_data (timestamp, temperature, humidity) VALUES (?1, ?2, ?3)",
        params![sample.timestamp, sample.temperature, sample.humidity],
    )?;

    for table in AggregateTable::ALL {
        aggregate::add_sample(tx, table, sample.timestamp, sample.temperature, sample.humidity)?;
    }

    Ok(())
}

/// Delete the raw row (if any) and recompute both enclosing buckets.
fn delete_in(tx: &Transaction<'_>, timestamp: i64) -> Result<bool> {
    let removed = tx.execute("DELETE FROM raw_data WHERE timestamp = ?", [timestamp])? > 0;

    for table in AggregateTable::ALL {
        aggregate::remove_sample(tx, table, timestamp)?;
    }

    Ok(removed)
}

fn sample_exists(conn: &Connection, timestamp: i64) -> Result<bool> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM raw_data WHERE timestamp = ?",
            [timestamp],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    Ok(exists)
}

// Write operations
impl Store {
    /// Save one sample and update its hourly and daily buckets atomically.
    ///
    /// `timestamp` defaults to the current time. Values are validated before
    /// the transaction starts; a storage failure rolls back all three tables
    /// and is recorded in the event log.
    pub fn save_weather_data(
        &mut self,
        timestamp: Option<i64>,
        temperature: f64,
        humidity: f64,
    ) -> Result<Sample> {
        let input = SampleInput::new(timestamp, temperature, humidity)?;
        self.save_input(input)
    }

    /// Save an already validated sample input.
    pub fn save_input(&mut self, input: SampleInput) -> Result<Sample> {
        let sample = input.at(now());

        self.write(
            &format!("save weather data at {}", sample.timestamp),
            |tx| save_in(tx, &sample),
        )?;

        debug!(
            "Saved sample at {}: {:.1} C, {:.1} %",
            sample.timestamp, sample.temperature, sample.humidity
        );
        Ok(sample)
    }

    /// Delete the sample at `timestamp` and recompute its buckets atomically.
    ///
    /// Returns whether a raw sample existed. Deleting a missing timestamp is
    /// not an error.
    pub fn delete_weather_data(&mut self, timestamp: i64) -> Result<bool> {
        let removed = self.write(&format!("delete weather data at {}", timestamp), |tx| {
            delete_in(tx, timestamp)
        })?;

        if removed {
            debug!("Deleted sample at {}", timestamp);
        } else {
            debug!("No sample at {} to delete", timestamp);
        }
        Ok(removed)
    }

    /// Overwrite the sample at `timestamp` (delete then save) in one transaction.
    pub fn replace_weather_data(
        &mut self,
        timestamp: i64,
        temperature: f64,
        humidity: f64,
    ) -> Result<Sample> {
        let input = SampleInput::new(Some(timestamp), temperature, humidity)?;
        let sample = input.at(timestamp);

        self.write(&format!("replace weather data at {}", timestamp), |tx| {
            delete_in(tx, timestamp)?;
            save_in(tx, &sample)
        })?;

        info!(
            "Replaced sample at {}: {:.1} C, {:.1} %",
            timestamp, temperature, humidity
        );
        Ok(sample)
    }

    /// Discard and refold both rollup tables from the raw samples.
    ///
    /// Returns the number of hourly and daily buckets written.
    pub fn rebuild_aggregates(&mut self) -> Result<(usize, usize)> {
        let counts = self.write("rebuild aggregates", |tx| {
            let hourly = aggregate::rebuild(tx, AggregateTable::Hourly)?;
            let daily = aggregate::rebuild(tx, AggregateTable::Daily)?;
            Ok((hourly, daily))
        })?;

        info!(
            "Rebuilt aggregates: {} hourly, {} daily buckets",
            counts.0, counts.1
        );
        Ok(counts)
    }

    /// Import `timestamp,temperature,humidity` CSV with a header row.
    ///
    /// Rows that cannot be decoded or fail validation are reported in
    /// [`ImportResult::errors`] and the rest of the input is still read;
    /// rows whose timestamp is already stored are skipped. The accepted rows
    /// are saved in a single transaction.
    pub fn import_csv<D: AsRef<[u8]>>(&mut self, data: D) -> Result<ImportResult> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(data.as_ref());

        let mut result = ImportResult::default();
        let mut samples = Vec::new();

        for record in reader.records() {
            result.total += 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    let line = e.position().map_or(0, |p| p.line());
                    result.errors.push(format!("line {}: {}", line, e));
                    continue;
                }
            };
            let line = record.position().map_or(0, |p| p.line());

            let parsed = if record.len() < 3 {
                Err(format!("expected 3 columns, found {}", record.len()))
            } else {
                parse_timestamp(&record[0])
                    .and_then(|ts| Ok(SampleInput::parse(None, &record[1], &record[2])?.at(ts)))
                    .map_err(|e| e.to_string())
            };

            match parsed {
                Ok(sample) => samples.push(sample),
                Err(e) => result.errors.push(format!("line {}: {}", line, e)),
            }
        }

        let imported = self.write("import CSV", |tx| {
            let mut imported = 0;
            let mut skipped = 0;
            for sample in &samples {
                if sample_exists(tx, sample.timestamp)? {
                    skipped += 1;
                    continue;
                }
                save_in(tx, sample)?;
                imported += 1;
            }
            Ok((imported, skipped))
        })?;

        result.imported = imported.0;
        result.skipped = imported.1;

        info!(
            "Imported {} of {} rows ({} skipped, {} rejected)",
            result.imported,
            result.total,
            result.skipped,
            result.errors.len()
        );

        if !result.errors.is_empty() {
            self.log(
                Severity::Warning,
                &format!("CSV import rejected {} rows", result.errors.len()),
            );
        }

        Ok(result)
    }
}

// Query operations
impl Store {
    /// Rows in `[start, end)` at the requested granularity, or at one chosen
    /// from the span when `requested` is `None`.
    pub fn get_weather_data(
        &self,
        start: i64,
        end: i64,
        requested: Option<Granularity>,
    ) -> Result<WeatherData> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }

        let granularity = resolve_granularity(start, end, requested, &self.thresholds);

        let rows = match AggregateTable::for_granularity(granularity) {
            None => WeatherRows::Raw(query::raw_range(&self.conn, start, end)?),
            Some(table) => {
                WeatherRows::Aggregated(query::aggregate_range(&self.conn, table, start, end)?)
            }
        };

        debug!(
            "Query [{}, {}) at {} returned {} rows",
            start,
            end,
            granularity,
            rows.len()
        );

        Ok(WeatherData {
            start,
            end,
            granularity,
            rows,
        })
    }

    /// Get the raw sample at exactly `timestamp`.
    pub fn get_sample(&self, timestamp: i64) -> Result<Option<Sample>> {
        let sample = self
            .conn
            .query_row(
                "SELECT timestamp, temperature, humidity FROM raw_data WHERE timestamp = ?",
                [timestamp],
                |row| Ok(Sample::new(row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        Ok(sample)
    }

    /// Get the rollup row for the bucket containing `timestamp`.
    pub fn get_aggregate(&self, table: AggregateTable, timestamp: i64) -> Result<Option<Aggregate>> {
        let key = crate::bucket::bucket_key(timestamp, table.span());
        aggregate::get(&self.conn, table, key)
    }

    /// Count raw samples.
    pub fn count_samples(&self) -> Result<u64> {
        count(&self.conn, "raw_data")
    }

    /// Row counts per table and the raw time range.
    pub fn stats(&self) -> Result<StoreStats> {
        let (first, last): (Option<i64>, Option<i64>) = self.conn.query_row(
            "SELECT MIN(timestamp), MAX(timestamp) FROM raw_data",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoreStats {
            raw_samples: count(&self.conn, "raw_data")?,
            hourly_buckets: count(&self.conn, AggregateTable::Hourly.name())?,
            daily_buckets: count(&self.conn, AggregateTable::Daily.name())?,
            log_entries: count(&self.conn, "log")?,
            time_range: first.zip(last),
        })
    }

    /// Export raw samples in `[start, end)` as CSV with a header row.
    pub fn export_csv(&self, start: i64, end: i64) -> Result<String> {
        let samples = query::raw_range(&self.conn, start, end)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(["timestamp", "temperature", "humidity"])?;
        for sample in &samples {
            writer.serialize(sample)?;
        }

        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// Export raw samples in `[start, end)` as a JSON array.
    pub fn export_json(&self, start: i64, end: i64) -> Result<String> {
        let samples = query::raw_range(&self.conn, start, end)?;
        Ok(serde_json::to_string_pretty(&samples)?)
    }
}

fn count(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(count as u64)
}

// Event log operations
impl Store {
    /// Append an event log entry. Never fails; a failed write is reported on
    /// the tracing output and dropped.
    pub fn log(&self, severity: Severity, message: &str) {
        event_log::append_best_effort(&self.conn, severity, message);
    }

    /// Append an event log entry and report whether it was written.
    pub fn try_log(&self, severity: Severity, message: &str) -> Result<i64> {
        event_log::append(&self.conn, severity, message)
    }

    /// List event log entries, newest first.
    pub fn recent_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        event_log::list(&self.conn, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_rows(data: &WeatherData) -> &[Sample] {
        match &data.rows {
            WeatherRows::Raw(rows) => rows,
            other => panic!("expected raw rows, got {:?}", other),
        }
    }

    fn aggregated_rows(data: &WeatherData) -> &[Aggregate] {
        match &data.rows {
            WeatherRows::Aggregated(rows) => rows,
            other => panic!("expected aggregated rows, got {:?}", other),
        }
    }

    fn inject_daily_fault(store: &Store) {
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER fail_daily_insert BEFORE INSERT ON daily_data
                 BEGIN SELECT RAISE(ABORT, 'injected fault'); END;
                 CREATE TRIGGER fail_daily_update BEFORE UPDATE ON daily_data
                 BEGIN SELECT RAISE(ABORT, 'injected fault'); END;",
            )
            .unwrap();
    }

    #[test]
    fn test_open_in_memory() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.count_samples().unwrap(), 0);
        assert_eq!(store.thresholds(), &QueryThresholds::default());
    }

    #[test]
    fn test_round_trip() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_weather_data(Some(1000), 20.0, 50.0).unwrap();

        let data = store
            .get_weather_data(1000, 1001, Some(Granularity::Raw))
            .unwrap();
        assert_eq!(data.granularity, Granularity::Raw);
        assert_eq!(raw_rows(&data), &[Sample::new(1000, 20.0, 50.0)]);
    }

    #[test]
    fn test_save_defaults_timestamp_to_now() {
        let mut store = Store::open_in_memory().unwrap();
        let before = now();
        let sample = store.save_weather_data(None, 21.0, 45.0).unwrap();
        let after = now();

        assert!(sample.timestamp >= before && sample.timestamp <= after);
        assert_eq!(store.get_sample(sample.timestamp).unwrap(), Some(sample));
    }

    #[test]
    fn test_save_updates_hour_and_day() {
        let mut store = Store::open_in_memory().unwrap();
        for (ts, t) in [(3_600, 10.0), (3_660, 30.0), (3_720, 20.0)] {
            store.save_weather_data(Some(ts), t, 50.0).unwrap();
        }

        for table in AggregateTable::ALL {
            let agg = store.get_aggregate(table, 3_600).unwrap().unwrap();
            assert_eq!(agg.min_temperature, 10.0);
            assert_eq!(agg.max_temperature, 30.0);
            assert!((agg.temperature - 20.0).abs() < 1e-12);
            assert_eq!(agg.number_values, 3);
        }
        assert_eq!(
            store.get_aggregate(AggregateTable::Hourly, 3_600).unwrap().unwrap().timestamp,
            3_600
        );
        assert_eq!(
            store.get_aggregate(AggregateTable::Daily, 3_600).unwrap().unwrap().timestamp,
            0
        );
    }

    #[test]
    fn test_invalid_input_rejected_before_transaction() {
        let mut store = Store::open_in_memory().unwrap();

        let err = store.save_weather_data(Some(5), f64::NAN, 50.0).unwrap_err();
        assert!(err.is_invalid_input());

        assert_eq!(store.count_samples().unwrap(), 0);
        // Nothing reached the transaction, so nothing was logged either.
        assert!(store.recent_logs(&LogQuery::new()).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_timestamp_is_storage_error() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_weather_data(Some(10), 20.0, 50.0).unwrap();

        let err = store.save_weather_data(Some(10), 25.0, 55.0).unwrap_err();
        assert!(err.is_storage());

        let agg = store.get_aggregate(AggregateTable::Hourly, 10).unwrap().unwrap();
        assert_eq!(agg.number_values, 1);
        assert_eq!(agg.temperature, 20.0);

        let logs = store
            .recent_logs(&LogQuery::new().max_severity(Severity::Error))
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].message.contains("save weather data at 10"));
    }

    #[test]
    fn test_save_is_atomic_when_daily_update_fails() {
        let mut store = Store::open_in_memory().unwrap();
        inject_daily_fault(&store);

        let err = store.save_weather_data(Some(1000), 20.0, 50.0).unwrap_err();
        assert!(err.is_storage());

        assert!(store.get_sample(1000).unwrap().is_none());
        assert!(store.get_aggregate(AggregateTable::Hourly, 1000).unwrap().is_none());
        assert!(store.get_aggregate(AggregateTable::Daily, 1000).unwrap().is_none());

        let logs = store.recent_logs(&LogQuery::new()).unwrap();
        assert_eq!(logs[0].severity, Severity::Error);
        assert!(logs[0].message.contains("injected fault"));
    }

    #[test]
    fn test_failed_save_leaves_existing_buckets_untouched() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_weather_data(Some(100), 20.0, 50.0).unwrap();
        inject_daily_fault(&store);

        assert!(store.save_weather_data(Some(200), 40.0, 90.0).is_err());

        let hour = store.get_aggregate(AggregateTable::Hourly, 100).unwrap().unwrap();
        assert_eq!(hour.number_values, 1);
        assert_eq!(hour.max_temperature, 20.0);
        assert_eq!(store.count_samples().unwrap(), 1);
    }

    #[test]
    fn test_delete_reconstructs_bucket() {
        let mut store = Store::open_in_memory().unwrap();
        let values = [(0, 15.0, 40.0), (60, 35.0, 80.0), (120, 20.0, 55.0), (180, 18.0, 45.0)];
        for (ts, t, h) in values {
            store.save_weather_data(Some(ts), t, h).unwrap();
        }

        assert!(store.delete_weather_data(60).unwrap());

        let mut fresh = Store::open_in_memory().unwrap();
        for (ts, t, h) in values.iter().filter(|v| v.0 != 60) {
            fresh.save_weather_data(Some(*ts), *t, *h).unwrap();
        }

        for table in AggregateTable::ALL {
            let got = store.get_aggregate(table, 0).unwrap().unwrap();
            let want = fresh.get_aggregate(table, 0).unwrap().unwrap();
            assert_eq!(got.number_values, want.number_values);
            assert!((got.temperature - want.temperature).abs() < 1e-9);
            assert!((got.humidity - want.humidity).abs() < 1e-9);
            assert_eq!(got.min_temperature, want.min_temperature);
            assert_eq!(got.max_temperature, want.max_temperature);
            assert_eq!(got.min_humidity, want.min_humidity);
            assert_eq!(got.max_humidity, want.max_humidity);
        }
    }

    #[test]
    fn test_delete_last_sample_removes_buckets() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_weather_data(Some(7_300), 20.0, 50.0).unwrap();

        assert!(store.delete_weather_data(7_300).unwrap());

        assert!(store.get_aggregate(AggregateTable::Hourly, 7_300).unwrap().is_none());
        assert!(store.get_aggregate(AggregateTable::Daily, 7_300).unwrap().is_none());
        let stats = store.stats().unwrap();
        assert_eq!(stats.hourly_buckets, 0);
        assert_eq!(stats.daily_buckets, 0);
    }

    #[test]
    fn test_delete_missing_timestamp_is_noop() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_weather_data(Some(100), 20.0, 50.0).unwrap();

        assert!(!store.delete_weather_data(200).unwrap());

        let hour = store.get_aggregate(AggregateTable::Hourly, 100).unwrap().unwrap();
        assert_eq!(hour.number_values, 1);
        assert_eq!(store.count_samples().unwrap(), 1);
    }

    #[test]
    fn test_extreme_timestamps_rejected_or_ignored() {
        let mut store = Store::open_in_memory().unwrap();

        for ts in [i64::MIN, i64::MAX] {
            let err = store.save_weather_data(Some(ts), 20.0, 50.0).unwrap_err();
            assert!(err.is_invalid_input());
            let err = store.replace_weather_data(ts, 20.0, 50.0).unwrap_err();
            assert!(err.is_invalid_input());

            assert!(!store.delete_weather_data(ts).unwrap());
            for table in AggregateTable::ALL {
                assert_eq!(store.get_aggregate(table, ts).unwrap(), None);
            }
        }

        assert_eq!(store.count_samples().unwrap(), 0);
        let data = store.get_weather_data(i64::MIN, i64::MAX, None).unwrap();
        assert_eq!(data.granularity, Granularity::Day);
        assert!(data.rows.is_empty());
    }

    #[test]
    fn test_fix_up_via_delete_then_save() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_weather_data(Some(100), 20.0, 50.0).unwrap();
        store.save_weather_data(Some(200), 99.0, 50.0).unwrap();

        store.delete_weather_data(200).unwrap();
        store.save_weather_data(Some(200), 22.0, 52.0).unwrap();

        let hour = store.get_aggregate(AggregateTable::Hourly, 0).unwrap().unwrap();
        assert_eq!(hour.max_temperature, 22.0);
        assert!((hour.temperature - 21.0).abs() < 1e-12);
        assert_eq!(hour.number_values, 2);
    }

    #[test]
    fn test_replace_weather_data() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_weather_data(Some(100), 20.0, 50.0).unwrap();
        store.save_weather_data(Some(200), -99.0, 50.0).unwrap();

        let fixed = store.replace_weather_data(200, 24.0, 54.0).unwrap();
        assert_eq!(fixed, Sample::new(200, 24.0, 54.0));

        let day = store.get_aggregate(AggregateTable::Daily, 0).unwrap().unwrap();
        assert_eq!(day.min_temperature, 20.0);
        assert_eq!(day.max_humidity, 54.0);
        assert_eq!(day.number_values, 2);

        // Replacing a timestamp that was never stored simply saves it.
        store.replace_weather_data(300, 21.0, 51.0).unwrap();
        assert_eq!(store.count_samples().unwrap(), 3);
    }

    #[test]
    fn test_replace_is_atomic() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_weather_data(Some(100), 20.0, 50.0).unwrap();
        inject_daily_fault(&store);

        assert!(store.replace_weather_data(100, 30.0, 60.0).is_err());
        assert_eq!(store.get_sample(100).unwrap(), Some(Sample::new(100, 20.0, 50.0)));
    }

    #[test]
    fn test_query_auto_granularity() {
        let mut store = Store::open_in_memory().unwrap();
        for i in 0..48 {
            store
                .save_weather_data(Some(i * 3_600 + 30), 20.0 + i as f64 * 0.1, 50.0)
                .unwrap();
        }

        let week = QueryThresholds::DEFAULT_HOUR_THRESHOLD;
        let raw = store.get_weather_data(0, week, None).unwrap();
        assert_eq!(raw.granularity, Granularity::Raw);
        assert_eq!(raw_rows(&raw).len(), 48);

        let hourly = store.get_weather_data(0, week + 1, None).unwrap();
        assert_eq!(hourly.granularity, Granularity::Hour);
        let rows = aggregated_rows(&hourly);
        assert_eq!(rows.len(), 48);
        assert!(rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

        let daily = store
            .get_weather_data(0, QueryThresholds::DEFAULT_DAY_THRESHOLD + 1, None)
            .unwrap();
        assert_eq!(daily.granularity, Granularity::Day);
        let rows = aggregated_rows(&daily);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number_values, 24);
    }

    #[test]
    fn test_query_range_is_half_open() {
        let mut store = Store::open_in_memory().unwrap();
        for ts in [100, 200, 300] {
            store.save_weather_data(Some(ts), 20.0, 50.0).unwrap();
        }

        let data = store.get_weather_data(100, 300, None).unwrap();
        assert_eq!(data.rows.timestamps(), vec![100, 200]);

        let empty = store.get_weather_data(200, 200, None).unwrap();
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn test_query_with_custom_thresholds() {
        let mut store = Store::open_in_memory()
            .unwrap()
            .with_thresholds(QueryThresholds::new(60, 7_200));
        store.save_weather_data(Some(10), 20.0, 50.0).unwrap();

        assert_eq!(
            store.get_weather_data(0, 61, None).unwrap().granularity,
            Granularity::Hour
        );
        assert_eq!(
            store.get_weather_data(0, 7_201, None).unwrap().granularity,
            Granularity::Day
        );
    }

    #[test]
    fn test_query_rejects_inverted_range() {
        let store = Store::open_in_memory().unwrap();
        let err = store.get_weather_data(10, 5, None).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { start: 10, end: 5 }));
    }

    #[test]
    fn test_log_and_try_log() {
        let store = Store::open_in_memory().unwrap();
        store.log(Severity::Notice, "probe attached");
        let id = store.try_log(Severity::Debug, "raw bits").unwrap();

        let entries = store.recent_logs(&LogQuery::new()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[1].message, "probe attached");
    }

    #[test]
    fn test_log_failure_does_not_fail_write() {
        let mut store = Store::open_in_memory().unwrap();
        store.conn.execute_batch("DROP TABLE log").unwrap();

        store.log(Severity::Error, "dropped");
        assert!(store.try_log(Severity::Error, "dropped").is_err());

        // A failing write still reports its own error, not the logging one.
        store.save_weather_data(Some(1), 20.0, 50.0).unwrap();
        let err = store.save_weather_data(Some(1), 20.0, 50.0).unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[test]
    fn test_import_csv() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_weather_data(Some(300), 20.0, 50.0).unwrap();

        let csv = "timestamp,temperature,humidity\n\
                   100,20.5,48\n\
                   1970-01-01T00:03:20Z,21.0,49.5\n\
                   300,22.0,50\n\
                   400,hot,50\n\
                   500\n";
        let result = store.import_csv(csv).unwrap();

        assert_eq!(result.total, 5);
        assert_eq!(result.imported, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("temperature"));

        assert_eq!(store.count_samples().unwrap(), 3);
        let hour = store.get_aggregate(AggregateTable::Hourly, 0).unwrap().unwrap();
        assert_eq!(hour.number_values, 3);

        let warnings = store
            .recent_logs(&LogQuery::new().max_severity(Severity::Warning))
            .unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_import_csv_continues_after_undecodable_row() {
        let mut store = Store::open_in_memory().unwrap();

        let data = b"timestamp,temperature,humidity\n1000,20,50\n\xff,1,2\n2000,21,51\n";
        let result = store.import_csv(data).unwrap();

        assert_eq!(result.total, 3);
        assert_eq!(result.imported, 2);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("line 3:"));
        assert!(store.get_sample(2000).unwrap().is_some());
    }

    #[test]
    fn test_export_csv_and_json() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_weather_data(Some(100), 20.5, 48.0).unwrap();
        store.save_weather_data(Some(200), 21.0, 49.0).unwrap();

        let csv = store.export_csv(0, 150).unwrap();
        assert_eq!(csv, "timestamp,temperature,humidity\n100,20.5,48.0\n");

        let empty = store.export_csv(1_000, 2_000).unwrap();
        assert_eq!(empty, "timestamp,temperature,humidity\n");

        let json = store.export_json(0, 1_000).unwrap();
        let parsed: Vec<Sample> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_export_then_import_into_fresh_store() {
        let mut source = Store::open_in_memory().unwrap();
        for (ts, t) in [(10, 19.5), (4_000, 20.5), (90_000, 21.5)] {
            source.save_weather_data(Some(ts), t, 50.0).unwrap();
        }
        let csv = source.export_csv(i64::MIN, i64::MAX).unwrap();

        let mut target = Store::open_in_memory().unwrap();
        let result = target.import_csv(&csv).unwrap();
        assert_eq!(result.imported, 3);
        assert_eq!(target.stats().unwrap(), source.stats().unwrap());
    }

    #[test]
    fn test_rebuild_aggregates() {
        let mut store = Store::open_in_memory().unwrap();
        for ts in [0, 1_800, 3_600, 90_000] {
            store.save_weather_data(Some(ts), 20.0, 50.0).unwrap();
        }
        store.conn.execute_batch("DELETE FROM hourly_data").unwrap();

        let (hourly, daily) = store.rebuild_aggregates().unwrap();
        assert_eq!((hourly, daily), (3, 2));
        assert_eq!(
            store.get_aggregate(AggregateTable::Hourly, 0).unwrap().unwrap().number_values,
            2
        );
    }

    #[test]
    fn test_stats() {
        let mut store = Store::open_in_memory().unwrap();
        assert_eq!(store.stats().unwrap(), StoreStats::default());

        store.save_weather_data(Some(50), 20.0, 50.0).unwrap();
        store.save_weather_data(Some(86_450), 20.0, 50.0).unwrap();
        store.log(Severity::Info, "hello");

        let stats = store.stats().unwrap();
        assert_eq!(stats.raw_samples, 2);
        assert_eq!(stats.hourly_buckets, 2);
        assert_eq!(stats.daily_buckets, 2);
        assert_eq!(stats.log_entries, 1);
        assert_eq!(stats.time_range, Some((50, 86_450)));
    }

    #[test]
    fn test_open_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("weather.db");

        {
            let mut store = Store::open(&path).unwrap();
            store.save_weather_data(Some(1), 20.0, 50.0).unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.count_samples().unwrap(), 1);
    }

    #[test]
    fn test_reader_handle_sees_committed_writes_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.db");

        let mut writer = Store::open(&path).unwrap();
        let reader = Store::open(&path).unwrap();

        writer.save_weather_data(Some(100), 20.0, 50.0).unwrap();
        assert_eq!(reader.count_samples().unwrap(), 1);

        inject_daily_fault(&writer);
        assert!(writer.save_weather_data(Some(200), 21.0, 51.0).is_err());

        let data = reader.get_weather_data(0, 1_000, Some(Granularity::Hour)).unwrap();
        assert_eq!(aggregated_rows(&data)[0].number_values, 1);
        assert_eq!(reader.count_samples().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_reads_during_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.db");
        let mut writer = Store::open(&path).unwrap();

        let reader_path = path.clone();
        let reader = std::thread::spawn(move || {
            let reader = Store::open(&reader_path).unwrap();
            for _ in 0..50 {
                let data = reader
                    .get_weather_data(0, 100_000, Some(Granularity::Hour))
                    .unwrap();
                let raw = reader.count_samples().unwrap();
                // Rows come from an earlier snapshot; raw only grows.
                let counted: u64 = aggregated_rows(&data)
                    .iter()
                    .map(|a| u64::from(a.number_values))
                    .sum();
                assert!(counted <= raw);
            }
        });

        for i in 0..100 {
            writer
                .save_weather_data(Some(i * 60), 20.0 + (i % 5) as f64, 50.0)
                .unwrap();
        }

        reader.join().unwrap();
        assert_eq!(writer.count_samples().unwrap(), 100);
    }
}
