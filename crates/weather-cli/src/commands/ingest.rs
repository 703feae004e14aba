//! Ingest command - save probe reader output.

use std::io::BufRead;

use anyhow::{Context, Result, bail};
use weather_store::Store;
use weather_types::{ProbeReading, Severity};

/// Execute the ingest command.
///
/// Each line is `"<temperature>;<humidity>"` as printed by the probe reader.
/// Lines that do not parse are recorded in the event log and skipped; a
/// storage failure aborts the run.
pub fn cmd_ingest(store: &mut Store, lines: Vec<String>, timestamp: Option<i64>) -> Result<()> {
    let lines = if lines.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("Failed to read from stdin")?
    } else {
        lines
    };

    let (saved, rejected) = ingest_lines(store, &lines, timestamp)?;

    tracing::info!("Ingested {} readings ({} rejected)", saved, rejected);
    if rejected > 0 {
        bail!("{} of {} probe lines rejected", rejected, saved + rejected);
    }
    Ok(())
}

/// Save every parseable line and return how many were saved and rejected.
fn ingest_lines(
    store: &mut Store,
    lines: &[String],
    timestamp: Option<i64>,
) -> Result<(usize, usize)> {
    let mut saved = 0;
    let mut rejected = 0;

    for line in lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        match ProbeReading::parse(line) {
            Ok(reading) => {
                let sample = store
                    .save_input(reading.into_input(timestamp))
                    .with_context(|| format!("Failed to save probe reading '{}'", line))?;
                println!(
                    "{} {:.1} {:.1}",
                    sample.timestamp, sample.temperature, sample.humidity
                );
                saved += 1;
            }
            Err(e) => {
                store.log(
                    Severity::Warning,
                    &format!("Rejected probe line '{}': {}", line, e),
                );
                rejected += 1;
            }
        }
    }

    Ok((saved, rejected))
}
