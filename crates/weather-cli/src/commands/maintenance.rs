//! Store maintenance and configuration commands.

use std::path::Path;

use anyhow::{Context, Result};
use weather_store::Store;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;
use crate::format::{as_json, format_stats_csv, format_stats_text};

/// Execute the stats command.
pub fn cmd_stats(store: &Store, format: OutputFormat) -> Result<()> {
    let stats = store.stats().context("Failed to read store statistics")?;

    let output = match format {
        OutputFormat::Text => format_stats_text(&stats),
        OutputFormat::Json => as_json(&stats)?,
        OutputFormat::Csv => format_stats_csv(&stats),
    };
    print!("{}", output);
    Ok(())
}

/// Execute the rebuild command.
pub fn cmd_rebuild(store: &mut Store) -> Result<()> {
    let (hourly, daily) = store
        .rebuild_aggregates()
        .context("Failed to rebuild aggregates")?;

    println!(
        "Rebuilt {} hourly and {} daily buckets from raw samples",
        hourly, daily
    );
    Ok(())
}

/// Execute the config command.
pub fn cmd_config(action: ConfigAction, path: &Path, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Show => {
            let content =
                toml::to_string_pretty(config).context("Failed to serialize configuration")?;
            print!("{}", content);
            println!("# database: {}", config.database_path().display());
        }
    }
    Ok(())
}
