use std::path::Path;

use crate::cli::report::format_statement;
use crate::error::Result;
use crate::pdftext::PdfDocument;
use crate::pipeline::process_statement;
use crate::profiles::LayoutRegistry;

pub fn run(file: &Path, institution: &str, account_type: &str, json: bool) -> Result<()> {
    let layout = LayoutRegistry::default().lookup(institution, account_type)?;
    let doc = PdfDocument::open(file)?;
    let outcome = process_statement(&doc, layout)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.transactions)?);
    } else {
        println!("{}", format_statement(&outcome));
    }
    Ok(())
}
