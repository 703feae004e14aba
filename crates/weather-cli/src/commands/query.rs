//! Query command - read a range at a chosen or automatic granularity.

use anyhow::{Context, Result};
use time::OffsetDateTime;
use weather_store::Store;
use weather_types::Granularity;

use crate::cli::OutputFormat;
use crate::format::{as_json, format_data_csv, format_data_text};

/// Execute the query command.
pub fn cmd_query(
    store: &Store,
    start: i64,
    end: Option<i64>,
    granularity: &str,
    format: OutputFormat,
) -> Result<()> {
    let end = end.unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp());
    let requested = Granularity::parse_request(granularity);

    let data = store
        .get_weather_data(start, end, requested)
        .context("Failed to query weather data")?;

    tracing::debug!(
        "Query [{}, {}) returned {} {} rows",
        start,
        end,
        data.rows.len(),
        data.granularity
    );

    let output = match format {
        OutputFormat::Text => format_data_text(&data),
        OutputFormat::Json => as_json(&data)?,
        OutputFormat::Csv => format_data_csv(&data),
    };
    print!("{}", output);
    Ok(())
}
