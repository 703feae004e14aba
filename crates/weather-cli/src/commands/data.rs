//! Bulk import and export commands.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use weather_store::{ImportResult, Store};

use crate::cli::ExportFormat;

/// Execute the import command.
pub fn cmd_import(store: &mut Store, input: Option<PathBuf>) -> Result<()> {
    let data = match input {
        Some(path) => std::fs::read(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?,
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        }
    };

    let result = store.import_csv(&data).context("Failed to import CSV")?;
    print!("{}", import_report(&result));
    Ok(())
}

fn import_report(result: &ImportResult) -> String {
    let mut report = format!(
        "Import complete:\n  Total rows: {}\n  Imported: {}\n  Skipped (duplicates): {}\n",
        result.total, result.imported, result.skipped
    );

    if !result.errors.is_empty() {
        report.push_str(&format!("\nErrors ({}):\n", result.errors.len()));
        for err in result.errors.iter().take(10) {
            report.push_str(&format!("  {}\n", err));
        }
        if result.errors.len() > 10 {
            report.push_str(&format!(
                "  ... and {} more errors\n",
                result.errors.len() - 10
            ));
        }
    }

    report
}

/// Execute the export command.
///
/// Without explicit bounds the whole stored range is exported.
pub fn cmd_export(
    store: &Store,
    format: ExportFormat,
    output: Option<&Path>,
    since: Option<i64>,
    until: Option<i64>,
) -> Result<()> {
    let (first, last) = store.stats()?.time_range.unwrap_or((0, 0));
    let start = since.unwrap_or(first);
    let end = until.unwrap_or_else(|| last.saturating_add(1));

    let content = match format {
        ExportFormat::Csv => store.export_csv(start, end)?,
        ExportFormat::Json => store.export_json(start, end)? + "\n",
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
