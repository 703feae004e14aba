//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use weather_types::Severity;

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Export file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// Parse a timestamp argument (epoch seconds, RFC 3339 or YYYY-MM-DD).
fn parse_timestamp_arg(s: &str) -> Result<i64, String> {
    weather_types::parse_timestamp(s).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "weather")]
#[command(author, version, about = "Store and query weather station samples", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ~/.config/weather/config.toml)
    #[arg(short, long, global = true, env = "WEATHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured path
    #[arg(long, global = true, env = "WEATHER_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save probe output lines ("<temperature>;<humidity>")
    Ingest {
        /// Probe lines; read from stdin when omitted
        lines: Vec<String>,

        /// Timestamp for the reading (default: now)
        #[arg(short, long, value_parser = parse_timestamp_arg)]
        timestamp: Option<i64>,
    },

    /// Save a single sample
    Save {
        /// Temperature in degrees Celsius
        #[arg(short = 'T', long, allow_hyphen_values = true)]
        temperature: String,

        /// Relative humidity in percent
        #[arg(short = 'H', long)]
        humidity: String,

        /// Timestamp (epoch seconds, RFC 3339 or YYYY-MM-DD; default: now)
        #[arg(short, long)]
        timestamp: Option<String>,
    },

    /// Delete the sample at a timestamp and recompute its buckets
    Delete {
        /// Timestamp of the sample
        #[arg(value_parser = parse_timestamp_arg, allow_hyphen_values = true)]
        timestamp: i64,
    },

    /// Replace the sample at a timestamp
    Fix {
        /// Timestamp of the sample
        #[arg(value_parser = parse_timestamp_arg, allow_hyphen_values = true)]
        timestamp: i64,

        /// Corrected temperature in degrees Celsius
        #[arg(short = 'T', long, allow_hyphen_values = true)]
        temperature: f64,

        /// Corrected relative humidity in percent
        #[arg(short = 'H', long)]
        humidity: f64,
    },

    /// Query samples in [start, end)
    Query {
        /// Range start
        #[arg(short, long, value_parser = parse_timestamp_arg)]
        start: i64,

        /// Range end, exclusive (default: now)
        #[arg(short, long, value_parser = parse_timestamp_arg)]
        end: Option<i64>,

        /// Granularity (raw, hour, day); anything else picks one from the span
        #[arg(short, long, default_value = "auto")]
        granularity: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Import samples from CSV (timestamp,temperature,humidity)
    Import {
        /// Input file; read from stdin when omitted
        input: Option<PathBuf>,
    },

    /// Export raw samples
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Range start (default: oldest sample)
        #[arg(long, value_parser = parse_timestamp_arg)]
        since: Option<i64>,

        /// Range end, exclusive (default: after the newest sample)
        #[arg(long, value_parser = parse_timestamp_arg)]
        until: Option<i64>,
    },

    /// Show the diagnostic event log, newest first
    Logs {
        /// Maximum number of entries
        #[arg(short = 'n', long, default_value = "20")]
        limit: u32,

        /// Only entries at least this severe (e.g. warning, err, 3)
        #[arg(short, long)]
        severity: Option<Severity>,

        /// Only entries logged at or after this time
        #[arg(long, value_parser = parse_timestamp_arg)]
        since: Option<i64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show row counts and the stored time range
    Stats {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Recompute the hourly and daily tables from raw samples
    Rebuild,

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
}
