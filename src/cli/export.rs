use std::path::{Path, PathBuf};

use crate::cli::scan::scan;
use crate::error::Result;
use crate::export::{dated_path, write_file};
use crate::loader::discover;
use crate::pipeline::filename_coverage;
use crate::profiles::LayoutRegistry;
use crate::settings::load_settings;

/// Render the coverage report for `root` to PDF. Returns the written path.
pub fn coverage(
    root: &Path,
    output: Option<PathBuf>,
    from_filenames: bool,
    jobs: Option<usize>,
) -> Result<String> {
    let settings = load_settings();
    let subtitle = root.display().to_string();

    let bytes = if from_filenames {
        let files = discover(root, &settings.institutions, &LayoutRegistry::default())?;
        crate::pdf::render_filename_coverage(&filename_coverage(&files), &subtitle)?
    } else {
        let report = scan(root, &settings, jobs, false)?;
        crate::pdf::render_coverage(&report, &subtitle)?
    };

    let path = output.unwrap_or_else(|| dated_path(&settings.output_path(), "coverage", "pdf"));
    let written = write_file(&bytes, &path)?;
    println!("Wrote {written}");
    Ok(written)
}
