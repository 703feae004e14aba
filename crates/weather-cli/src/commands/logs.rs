//! Logs command - show the diagnostic event log.

use anyhow::{Context, Result};
use weather_store::{LogQuery, Store};
use weather_types::Severity;

use crate::cli::OutputFormat;
use crate::format::{as_json, format_logs_csv, format_logs_text};

/// Execute the logs command.
pub fn cmd_logs(
    store: &Store,
    limit: u32,
    severity: Option<Severity>,
    since: Option<i64>,
    format: OutputFormat,
) -> Result<()> {
    let mut query = LogQuery::new().limit(limit);
    if let Some(severity) = severity {
        query = query.max_severity(severity);
    }
    if let Some(since) = since {
        query = query.since(since);
    }

    let entries = store
        .recent_logs(&query)
        .context("Failed to read event log")?;

    let output = match format {
        OutputFormat::Text => format_logs_text(&entries),
        OutputFormat::Json => as_json(&entries)?,
        OutputFormat::Csv => format_logs_csv(&entries),
    };
    print!("{}", output);
    Ok(())
}
