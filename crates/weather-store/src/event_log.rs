//! Append-only diagnostic event log.
//!
//! Logging must never be the reason a write fails, so the store only exposes
//! these functions through [`Store::log`](crate::Store::log), which swallows
//! errors, and [`Store::try_log`](crate::Store::try_log) for callers that want
//! to know whether the entry landed.

use rusqlite::{Connection, params};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use weather_types::Severity;

use crate::error::Result;
use crate::models::LogEntry;

/// Fluent query builder for event log entries.
///
/// Entries are returned newest first.
///
/// # Example
///
/// ```
/// use weather_store::LogQuery;
/// use weather_types::Severity;
///
/// // The 20 most recent warnings or worse
/// let query = LogQuery::new().max_severity(Severity::Warning).limit(20);
/// ```
#[derive(Debug, Default, Clone)]
pub struct LogQuery {
    /// Only include entries at least this severe.
    pub max_severity: Option<Severity>,
    /// Only include entries logged at or after this timestamp.
    pub since: Option<i64>,
    /// Maximum number of results.
    pub limit: Option<u32>,
}

impl LogQuery {
    /// Create a query matching every entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only include entries at least as severe as `severity`.
    ///
    /// Severities are ordered like syslog, so `Severity::Warning` matches
    /// warnings, errors and everything worse.
    pub fn max_severity(mut self, severity: Severity) -> Self {
        self.max_severity = Some(severity);
        self
    }

    /// Only include entries logged at or after `timestamp`.
    pub fn since(mut self, timestamp: i64) -> Self {
        self.since = Some(timestamp);
        self
    }

    /// Limit the number of entries returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn build_sql(&self) -> (String, Vec<i64>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(severity) = self.max_severity {
            conditions.push("severity <= ?");
            params.push(i64::from(severity as u8));
        }

        if let Some(since) = self.since {
            conditions.push("timestamp >= ?");
            params.push(since);
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let mut sql = format!(
            "SELECT id, timestamp, severity, message FROM log {} ORDER BY id DESC",
            where_clause
        );

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        (sql, params)
    }
}

/// Mirror an entry to the process-local diagnostic stream.
fn trace(severity: Severity, message: &str) {
    match severity {
        Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => {
            error!(target: "weather_store::event_log", "{}: {}", severity, message)
        }
        Severity::Warning => warn!(target: "weather_store::event_log", "{}", message),
        Severity::Notice | Severity::Info => {
            info!(target: "weather_store::event_log", "{}", message)
        }
        Severity::Debug => debug!(target: "weather_store::event_log", "{}", message),
    }
}

/// Append an entry and return its row id.
pub(crate) fn append(conn: &Connection, severity: Severity, message: &str) -> Result<i64> {
    trace(severity, message);

    let now = OffsetDateTime::now_utc().unix_timestamp();
    conn.execute(
        "INSERT INTO log (timestamp, severity, message) VALUES (?1, ?2, ?3)",
        params![now, severity as u8, message],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Append an entry, reporting a failure only on the diagnostic stream.
pub(crate) fn append_best_effort(conn: &Connection, severity: Severity, message: &str) {
    if let Err(e) = append(conn, severity, message) {
        warn!("Dropped event log entry ({}: {}): {}", severity, message, e);
    }
}

/// List entries matching `query`, newest first.
pub(crate) fn list(conn: &Connection, query: &LogQuery) -> Result<Vec<LogEntry>> {
    let (sql, params) = query.build_sql();

    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            let level: u8 = row.get(2)?;
            let severity = Severity::try_from(level).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(e))
            })?;
            Ok(LogEntry {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                severity,
                message: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(entries)
}
