use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::cli::report::{format_coverage, format_summary};
use crate::error::Result;
use crate::export::{dated_path, write_ledger};
use crate::loader::discover;
use crate::pdftext::PdfDocument;
use crate::pipeline::{run_batch, BatchOptions, BatchReport};
use crate::profiles::LayoutRegistry;
use crate::settings::{load_settings, OutputFormat, Settings};

pub struct ScanArgs {
    pub root: PathBuf,
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub jobs: Option<usize>,
    pub keep_unreconciled: bool,
    pub json: bool,
}

/// Discover and parse every statement under `root`. Per-statement problems end up in
/// the report, never in the returned error.
pub fn scan(
    root: &Path,
    settings: &Settings,
    jobs: Option<usize>,
    keep_unreconciled: bool,
) -> Result<BatchReport> {
    let registry = LayoutRegistry::default();
    let files = discover(root, &settings.institutions, &registry)?;
    let options = BatchOptions {
        jobs: jobs.unwrap_or(settings.jobs),
        keep_unreconciled: keep_unreconciled || settings.keep_unreconciled,
    };
    run_batch(&files, &registry, &options, PdfDocument::open)
}

pub fn run(args: ScanArgs) -> Result<()> {
    let settings = load_settings();
    let report = scan(&args.root, &settings, args.jobs, args.keep_unreconciled)?;

    let format = args.format.unwrap_or(settings.output_format);
    let path = args
        .output
        .unwrap_or_else(|| dated_path(&settings.output_path(), "ledger", format.extension()));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(&path)?);
    write_ledger(&report.ledger, report.depth(), format, writer)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_summary(&report));
        println!();
        println!("{}", format_coverage(&report.coverage));
    }
    eprintln!("Wrote {}", path.display());
    Ok(())
}
