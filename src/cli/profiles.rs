use crate::cli::report::format_profiles;
use crate::error::Result;
use crate::profiles::LayoutRegistry;

pub fn run() -> Result<()> {
    println!("{}", format_profiles(LayoutRegistry::default().all()));
    Ok(())
}
