use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{
    load_settings, save_settings, settings_file_exists, settings_path, shellexpand_path,
    OutputFormat,
};

pub fn run(
    output_dir: Option<String>,
    format: Option<OutputFormat>,
    jobs: Option<usize>,
    institutions: Vec<String>,
    keep_unreconciled: Option<bool>,
) -> Result<()> {
    let existed = settings_file_exists();
    let mut settings = load_settings();

    if let Some(dir) = output_dir {
        settings.output_dir = shellexpand_path(&dir);
    }
    if let Some(format) = format {
        settings.output_format = format;
    }
    if let Some(jobs) = jobs {
        settings.jobs = jobs;
    }
    if !institutions.is_empty() {
        settings.institutions = institutions.iter().map(|i| i.to_lowercase()).collect();
    }
    if let Some(keep) = keep_unreconciled {
        settings.keep_unreconciled = keep;
    }

    save_settings(&settings)?;
    std::fs::create_dir_all(PathBuf::from(shellexpand_path(&settings.output_dir)))?;

    let verb = if existed { "Updated" } else { "Wrote" };
    println!("{verb} {}", settings_path().display());
    println!("Output dir:   {}", settings.output_dir);
    println!("Format:       {}", settings.output_format.extension());
    println!("Institutions: {}", settings.institutions.join(", "));
    Ok(())
}
