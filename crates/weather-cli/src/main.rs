//! Command-line interface for the weather station store.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ingest` | Save probe reader output lines |
//! | `save` | Save one sample |
//! | `delete` | Delete a sample and recompute its buckets |
//! | `fix` | Replace a sample atomically |
//! | `query` | Read a range at raw, hourly or daily granularity |
//! | `import` / `export` | Bulk CSV/JSON transfer of raw samples |
//! | `logs` | Show the diagnostic event log |
//! | `stats` | Row counts and stored time range |
//! | `rebuild` | Recompute rollups from raw samples |
//! | `config` | Show configuration |
//!
//! # Example
//!
//! ```bash
//! DHT_reader | weather ingest
//! weather query --start 2024-03-01 --end 2024-04-01 --format csv
//! ```

mod cli;
mod commands;
mod config;
mod format;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use weather_store::Store;

use cli::{Cli, Commands};
use commands::*;
use config::{Config, default_config_path};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = Config::load_validated(Some(config_path.as_path()))?;

    // Initialize tracing
    // -q and -v override RUST_LOG, which overrides the configured level
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Config { action } = cli.command {
        return cmd_config(action, &config_path, &config);
    }

    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    tracing::debug!("Using database {}", db_path.display());

    let mut store = Store::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?
        .with_thresholds(config.query);

    match cli.command {
        Commands::Ingest { lines, timestamp } => cmd_ingest(&mut store, lines, timestamp),
        Commands::Save {
            temperature,
            humidity,
            timestamp,
        } => cmd_save(&mut store, &temperature, &humidity, timestamp.as_deref()),
        Commands::Delete { timestamp } => cmd_delete(&mut store, timestamp),
        Commands::Fix {
            timestamp,
            temperature,
            humidity,
        } => cmd_fix(&mut store, timestamp, temperature, humidity),
        Commands::Query {
            start,
            end,
            granularity,
            format,
        } => cmd_query(&store, start, end, &granularity, format),
        Commands::Import { input } => cmd_import(&mut store, input),
        Commands::Export {
            format,
            output,
            since,
            until,
        } => cmd_export(&store, format, output.as_deref(), since, until),
        Commands::Logs {
            limit,
            severity,
            since,
            format,
        } => cmd_logs(&store, limit, severity, since, format),
        Commands::Stats { format } => cmd_stats(&store, format),
        Commands::Rebuild => cmd_rebuild(&mut store),
        Commands::Config { .. } => unreachable!("handled before opening the store"),
    }
}
