//! Single-sample write commands: save, delete and fix.

use anyhow::{Context, Result};
use weather_store::Store;
use weather_types::SampleInput;

use crate::format::format_timestamp;

/// Execute the save command.
pub fn cmd_save(
    store: &mut Store,
    temperature: &str,
    humidity: &str,
    timestamp: Option<&str>,
) -> Result<()> {
    let input = SampleInput::parse(timestamp, temperature, humidity)?;
    let sample = store.save_input(input).context("Failed to save sample")?;

    println!(
        "Saved {:.1} C, {:.1} % at {}",
        sample.temperature,
        sample.humidity,
        format_timestamp(sample.timestamp)
    );
    Ok(())
}

/// Execute the delete command.
pub fn cmd_delete(store: &mut Store, timestamp: i64) -> Result<()> {
    let removed = store
        .delete_weather_data(timestamp)
        .with_context(|| format!("Failed to delete sample at {}", timestamp))?;

    if removed {
        println!("Deleted sample at {}", format_timestamp(timestamp));
    } else {
        println!("No sample at {}", format_timestamp(timestamp));
    }
    Ok(())
}

/// Execute the fix command.
pub fn cmd_fix(store: &mut Store, timestamp: i64, temperature: f64, humidity: f64) -> Result<()> {
    let previous = store.get_sample(timestamp)?;
    let sample = store
        .replace_weather_data(timestamp, temperature, humidity)
        .with_context(|| format!("Failed to replace sample at {}", timestamp))?;

    match previous {
        Some(old) => println!(
            "Replaced {:.1} C, {:.1} % with {:.1} C, {:.1} % at {}",
            old.temperature,
            old.humidity,
            sample.temperature,
            sample.humidity,
            format_timestamp(timestamp)
        ),
        None => println!(
            "Saved {:.1} C, {:.1} % at {}",
            sample.temperature,
            sample.humidity,
            format_timestamp(timestamp)
        ),
    }
    Ok(())
}
