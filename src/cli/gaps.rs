use std::path::Path;

use crate::cli::report::format_coverage;
use crate::error::Result;
use crate::export::write_coverage_json;
use crate::loader::discover;
use crate::pipeline::filename_coverage;
use crate::profiles::LayoutRegistry;
use crate::settings::load_settings;

pub fn run(root: &Path, json: bool) -> Result<()> {
    let settings = load_settings();
    let files = discover(root, &settings.institutions, &LayoutRegistry::default())?;
    let undated = files.iter().filter(|f| f.file_month.is_none()).count();
    let groups = filename_coverage(&files);

    if json {
        write_coverage_json(&groups, std::io::stdout().lock())?;
        println!();
    } else {
        println!("{}", format_coverage(&groups));
    }
    if undated > 0 {
        eprintln!("{undated} file(s) without a YYYY-MM-DD date in the name were ignored");
    }
    Ok(())
}
