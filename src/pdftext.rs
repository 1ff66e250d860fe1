//! [`StatementDocument`] backed by poppler's `pdftotext -tsv` word boxes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::document::{build_grid, Grid, StatementDocument, TableSettings, Word};
use crate::error::{AuditError, Result};

const WORD_LEVEL: u8 = 5;

#[derive(Debug, Deserialize)]
struct TsvRow {
    level: u8,
    page_num: usize,
    par_num: u32,
    block_num: u32,
    line_num: u32,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Default)]
struct Page {
    words: Vec<Word>,
    /// (par, block, line) per word, parallel to `words`.
    lines: Vec<(u32, u32, u32)>,
}

pub struct PdfDocument {
    path: PathBuf,
    pages: Vec<Page>,
    checksum: String,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let checksum = hex::encode(Sha256::digest(&bytes));
        let tsv = run_pdftotext(path)?;
        let pages = parse_tsv(&tsv)?;
        debug!(path = %path.display(), pages = pages.len(), "loaded statement");
        Ok(Self {
            path: path.to_path_buf(),
            pages,
            checksum,
        })
    }

    fn page(&self, index: usize) -> Result<&Page> {
        self.pages.get(index).ok_or_else(|| {
            AuditError::Extraction(format!(
                "{}: no page {}",
                self.path.display(),
                index + 1
            ))
        })
    }
}

impl StatementDocument for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: usize) -> Result<String> {
        let page = self.page(page)?;
        let mut text = String::new();
        let mut current = None;
        for (word, line) in page.words.iter().zip(&page.lines) {
            match current {
                Some(prev) if prev == *line => text.push(' '),
                Some(_) => text.push('\n'),
                None => {}
            }
            text.push_str(&word.text);
            current = Some(*line);
        }
        if current.is_some() {
            text.push('\n');
        }
        Ok(text)
    }

    fn extract_table(&self, page: usize, settings: &TableSettings) -> Result<Option<Grid>> {
        Ok(build_grid(&self.page(page)?.words, settings))
    }

    fn checksum(&self) -> Option<&str> {
        Some(&self.checksum)
    }
}

fn run_pdftotext(path: &Path) -> Result<Vec<u8>> {
    let output = Command::new("pdftotext")
        .arg("-tsv")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                AuditError::Extraction("pdftotext not installed (poppler-utils)".to_string())
            }
            _ => AuditError::Extraction(format!("failed to run pdftotext: {e}")),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AuditError::Extraction(format!(
            "pdftotext failed on {} (exit {}): {}",
            path.display(),
            output.status.code().unwrap_or(-1),
            stderr.trim(),
        )));
    }
    Ok(output.stdout)
}

/// Words per page, in reading order as emitted by poppler.
fn parse_tsv(tsv: &[u8]) -> Result<Vec<Page>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(tsv);

    let mut pages: Vec<Page> = Vec::new();
    for row in reader.deserialize() {
        let row: TsvRow = row?;
        if row.page_num == 0 {
            continue;
        }
        if pages.len() < row.page_num {
            pages.resize_with(row.page_num, Page::default);
        }
        if row.level != WORD_LEVEL || row.text.trim().is_empty() {
            continue;
        }
        let page = &mut pages[row.page_num - 1];
        page.lines.push((row.par_num, row.block_num, row.line_num));
        page.words.push(Word {
            x0: row.left,
            top: row.top,
            x1: row.left + row.width,
            bottom: row.top + row.height,
            text: row.text,
        });
    }
    Ok(pages)
}
