//! Database schema and migrations.

use rusqlite::Connection;
use tracing::info;

use crate::aggregate::{self, AggregateTable};
use crate::error::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize the database schema.
///
/// Databases without a `schema_version` table are inspected: an existing
/// rollup without min/max columns is migrated as version 1, while tables
/// already in the current shape are only stamped.
pub fn initialize(conn: &Connection) -> Result<()> {
    match get_schema_version(conn)? {
        0 => match detect_unversioned(conn)? {
            0 | SCHEMA_VERSION => {
                create_schema_v2(conn)?;
                set_schema_version(conn, SCHEMA_VERSION)?;
            }
            legacy => {
                info!("Found unversioned database in version {} layout", legacy);
                migrate(conn, legacy)?;
            }
        },
        version if version < SCHEMA_VERSION => migrate(conn, version)?,
        _ => {}
    }

    Ok(())
}

/// Guess the layout of a database that predates version tracking.
///
/// Returns 0 when none of the data tables exist.
fn detect_unversioned(conn: &Connection) -> Result<i32> {
    let mut any = false;
    for table in DATA_TABLES {
        any |= table_exists(conn, table)?;
    }
    if !any {
        return Ok(0);
    }

    for table in ["hourly_data", "daily_data"] {
        if table_exists(conn, table)? && !column_exists(conn, table, "min_temperature")? {
            return Ok(1);
        }
    }

    if table_exists(conn, "hourly_data")? && table_exists(conn, "daily_data")? {
        Ok(SCHEMA_VERSION)
    } else {
        // Rollups missing; the migration rebuilds them from raw_data.
        Ok(1)
    }
}

const DATA_TABLES: [&str; 4] = ["raw_data", "hourly_data", "daily_data", "log"];

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name = ?",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT COUNT(*) > 0 FROM pragma_table_info(?1) WHERE name = ?2",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Get the current schema version.
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Create the current schema (version 2).
fn create_schema_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        -- One row per probe reading
        CREATE TABLE IF NOT EXISTS raw_data (
            timestamp INTEGER PRIMARY KEY,
            temperature REAL NOT NULL,
            humidity REAL NOT NULL
        );

        -- Rollups keyed by bucket start
        CREATE TABLE IF NOT EXISTS hourly_data (
            timestamp INTEGER PRIMARY KEY,
            temperature REAL NOT NULL,
            humidity REAL NOT NULL,
            min_temperature REAL NOT NULL,
            max_temperature REAL NOT NULL,
            min_humidity REAL NOT NULL,
            max_humidity REAL NOT NULL,
            number_values INTEGER NOT NULL CHECK (number_values > 0)
        );

        CREATE TABLE IF NOT EXISTS daily_data (
            timestamp INTEGER PRIMARY KEY,
            temperature REAL NOT NULL,
            humidity REAL NOT NULL,
            min_temperature REAL NOT NULL,
            max_temperature REAL NOT NULL,
            min_humidity REAL NOT NULL,
            max_humidity REAL NOT NULL,
            number_values INTEGER NOT NULL CHECK (number_values > 0)
        );

        -- Diagnostic event log (append-only)
        CREATE TABLE IF NOT EXISTS log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp INTEGER NOT NULL,
            severity INTEGER NOT NULL CHECK (severity BETWEEN 0 AND 7),
            message TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_log_timestamp ON log(timestamp);
        "#,
    )?;

    Ok(())
}

/// Run migrations from old_version to current.
fn migrate(conn: &Connection, old_version: i32) -> Result<()> {
    if old_version < 2 {
        migrate_to_v2(conn)?;
    }
    Ok(())
}

/// Reshape version 1 databases, whose rollups had no min/max columns.
///
/// The old tables that exist are renamed, the new shape is created, raw
/// samples and log entries are copied, and the rollups are rebuilt from the
/// raw samples so that their extremes are exact. Runs as a single
/// transaction.
fn migrate_to_v2(conn: &Connection) -> Result<()> {
    info!("Migrating database schema from version 1 to 2");

    let tx = conn.unchecked_transaction()?;

    let mut legacy = Vec::new();
    for table in DATA_TABLES {
        if table_exists(&tx, table)? {
            tx.execute_batch(&format!("ALTER TABLE {table} RENAME TO {table}_v1"))?;
            legacy.push(table);
        }
    }
    // The index follows the renamed log table and would block the new one.
    tx.execute_batch("DROP INDEX IF EXISTS idx_log_timestamp")?;

    create_schema_v2(&tx)?;

    let copied = if legacy.contains(&"raw_data") {
        tx.execute(
            "INSERT INTO raw_data (timestamp, temperature, humidity)
             SELECT timestamp, temperature, humidity FROM raw_data_v1
             WHERE temperature IS NOT NULL AND humidity IS NOT NULL",
            [],
        )?
    } else {
        0
    };
    if legacy.contains(&"log") {
        tx.execute(
            "INSERT INTO log (id, timestamp, severity, message)
             SELECT id, timestamp, severity, message FROM log_v1 ORDER BY id",
            [],
        )?;
    }

    let hourly = aggregate::rebuild(&tx, AggregateTable::Hourly)?;
    let daily = aggregate::rebuild(&tx, AggregateTable::Daily)?;

    for table in legacy {
        tx.execute_batch(&format!("DROP TABLE {table}_v1"))?;
    }

    set_schema_version(&tx, 2)?;
    tx.commit()?;

    info!(
        "Schema migrated: {} raw samples, {} hourly and {} daily buckets",
        copied, hourly, daily
    );

    Ok(())
}
