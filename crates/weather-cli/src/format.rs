//! Output formatting for query results, log entries and statistics.

use anyhow::Result;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use weather_store::{LogEntry, StoreStats};
use weather_types::{WeatherData, WeatherRows};

/// Render an epoch timestamp as RFC 3339, falling back to the raw number.
pub fn format_timestamp(timestamp: i64) -> String {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Serialize value to pretty JSON with a trailing newline.
pub fn as_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)? + "\n")
}

pub fn format_data_text(data: &WeatherData) -> String {
    let mut output = format!(
        "{} rows at {} granularity ({} .. {}):\n\n",
        data.rows.len(),
        data.granularity,
        format_timestamp(data.start),
        format_timestamp(data.end)
    );

    if data.rows.is_empty() {
        output.push_str("No data in range.\n");
        return output;
    }

    match &data.rows {
        WeatherRows::Raw(samples) => {
            output.push_str(&format!(
                "{:<25} {:>8} {:>8}\n",
                "Timestamp", "Temp", "Humidity"
            ));
            for s in samples {
                output.push_str(&format!(
                    "{:<25} {:>8.1} {:>8.1}\n",
                    format_timestamp(s.timestamp),
                    s.temperature,
                    s.humidity
                ));
            }
        }
        WeatherRows::Aggregated(rows) => {
            output.push_str(&format!(
                "{:<25} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>6}\n",
                "Bucket", "Temp", "Min", "Max", "Humidity", "Min", "Max", "N"
            ));
            for a in rows {
                output.push_str(&format!(
                    "{:<25} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>6}\n",
                    format_timestamp(a.timestamp),
                    a.temperature,
                    a.min_temperature,
                    a.max_temperature,
                    a.humidity,
                    a.min_humidity,
                    a.max_humidity,
                    a.number_values
                ));
            }
        }
    }

    output
}

pub fn format_data_csv(data: &WeatherData) -> String {
    let mut output = String::new();
    match &data.rows {
        WeatherRows::Raw(samples) => {
            output.push_str("timestamp,temperature,humidity\n");
            for s in samples {
                output.push_str(&format!("{},{},{}\n", s.timestamp, s.temperature, s.humidity));
            }
        }
        WeatherRows::Aggregated(rows) => {
            output.push_str(
                "timestamp,temperature,humidity,min_temperature,max_temperature,\
                 min_humidity,max_humidity,number_values\n",
            );
            for a in rows {
                output.push_str(&format!(
                    "{},{},{},{},{},{},{},{}\n",
                    a.timestamp,
                    a.temperature,
                    a.humidity,
                    a.min_temperature,
                    a.max_temperature,
                    a.min_humidity,
                    a.max_humidity,
                    a.number_values
                ));
            }
        }
    }
    output
}

pub fn format_logs_text(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return "No log entries.\n".to_string();
    }

    entries
        .iter()
        .map(|e| {
            format!(
                "{:<25} {:<9} {}\n",
                format_timestamp(e.timestamp),
                e.severity.as_str(),
                e.message
            )
        })
        .collect()
}

pub fn format_logs_csv(entries: &[LogEntry]) -> String {
    let mut output = String::from("id,timestamp,severity,message\n");
    for e in entries {
        output.push_str(&format!(
            "{},{},{},{}\n",
            e.id,
            e.timestamp,
            e.severity,
            csv_escape(&e.message)
        ));
    }
    output
}

pub fn format_stats_text(stats: &StoreStats) -> String {
    let mut output = String::from("Store statistics:\n");
    output.push_str(&format!("  Raw samples:    {}\n", stats.raw_samples));
    output.push_str(&format!("  Hourly buckets: {}\n", stats.hourly_buckets));
    output.push_str(&format!("  Daily buckets:  {}\n", stats.daily_buckets));
    output.push_str(&format!("  Log entries:    {}\n", stats.log_entries));
    match stats.time_range {
        Some((first, last)) => {
            output.push_str(&format!("  Oldest sample:  {}\n", format_timestamp(first)));
            output.push_str(&format!("  Newest sample:  {}\n", format_timestamp(last)));
        }
        None => output.push_str("  No samples stored.\n"),
    }
    output
}

pub fn format_stats_csv(stats: &StoreStats) -> String {
    let (first, last) = stats
        .time_range
        .map(|(f, l)| (f.to_string(), l.to_string()))
        .unwrap_or_default();
    format!(
        "raw_samples,hourly_buckets,daily_buckets,log_entries,oldest,newest\n{},{},{},{},{},{}\n",
        stats.raw_samples,
        stats.hourly_buckets,
        stats.daily_buckets,
        stats.log_entries,
        first,
        last
    )
}

/// Escape a CSV field (quote it when it contains separators or quotes).
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
