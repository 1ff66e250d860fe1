use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::models::{CoverageGroup, LedgerRow};
use crate::settings::OutputFormat;

#[derive(Serialize)]
struct LedgerRecord<'a> {
    hierarchy: Vec<String>,
    date: String,
    description: &'a str,
    amount: f64,
    source: &'a str,
}

/// Column names for a ledger whose keys sit `depth` levels below the institution.
pub fn ledger_header(depth: usize) -> Vec<String> {
    let mut header = vec!["Institution".to_string()];
    header.extend((1..=depth).map(|i| format!("Level {i}")));
    header.extend(["Date", "Description", "Amount", "Source"].map(String::from));
    header
}

pub fn write_ledger<W: Write>(
    rows: &[LedgerRow],
    depth: usize,
    format: OutputFormat,
    writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(writer);
            wtr.write_record(ledger_header(depth))?;
            for row in rows {
                let key = row.key.clone().padded(depth);
                let mut record: Vec<String> = key.labels().to_vec();
                record.push(row.transaction.date.format("%Y-%m-%d").to_string());
                record.push(row.transaction.description.clone());
                record.push(format!("{:.2}", row.transaction.amount));
                record.push(row.source.clone());
                wtr.write_record(&record)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            let records: Vec<LedgerRecord> = rows
                .iter()
                .map(|row| LedgerRecord {
                    hierarchy: row.key.clone().padded(depth).labels().to_vec(),
                    date: row.transaction.date.format("%Y-%m-%d").to_string(),
                    description: &row.transaction.description,
                    amount: row.transaction.amount,
                    source: &row.source,
                })
                .collect();
            serde_json::to_writer_pretty(writer, &records)?;
        }
    }
    Ok(())
}

pub fn write_coverage_json<W: Write>(groups: &[CoverageGroup], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, groups)?;
    Ok(())
}

/// `<dir>/<name>-<today>.<ext>`
pub fn dated_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    dir.join(format!("{name}-{date}.{extension}"))
}

/// Write bytes, creating parent folders. Returns the display path.
pub fn write_file(bytes: &[u8], path: &Path) -> Result<String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(path.display().to_string())
}
