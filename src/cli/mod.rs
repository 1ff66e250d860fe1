pub mod completions;
#[cfg(feature = "pdf")]
pub mod export;
pub mod extract;
pub mod gaps;
pub mod init;
pub mod profiles;
pub mod report;
pub mod scan;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::settings::OutputFormat;

#[derive(Parser)]
#[command(
    name = "statement-audit",
    version,
    about = "Reconcile monthly bank statements and report missing months per account folder."
)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the settings file.
    Init {
        /// Where ledgers are written (default: ~/Documents/statement-audit)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
        /// Ledger format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Worker threads, 0 for one per CPU
        #[arg(long)]
        jobs: Option<usize>,
        /// Whitelisted institution folder; repeat for several
        #[arg(long = "institution")]
        institutions: Vec<String>,
        /// Keep transactions from statements that fail reconciliation
        #[arg(long = "keep-unreconciled")]
        keep_unreconciled: Option<bool>,
    },
    /// Parse every statement under an archive folder, write the ledger and report coverage.
    Scan {
        /// Archive root: <root>/<institution>/<folders...>/<statement>.pdf
        root: PathBuf,
        /// Ledger path (default: <output_dir>/ledger-YYYY-MM-DD.<ext>)
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        #[arg(long)]
        jobs: Option<usize>,
        #[arg(long = "keep-unreconciled")]
        keep_unreconciled: bool,
        /// Print the batch report as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Parse one statement and print its transactions.
    Extract {
        file: PathBuf,
        #[arg(long, default_value = "RBC")]
        institution: String,
        /// Account type, e.g. Chequing or Visa
        #[arg(long = "type")]
        account_type: String,
        /// Print transactions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report missing months from statement file names alone.
    Gaps {
        root: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List supported statement layouts.
    Profiles,
    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Export reports to PDF.
    #[cfg(feature = "pdf")]
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
}

#[cfg(feature = "pdf")]
#[derive(Subcommand)]
pub enum ExportCommands {
    /// Coverage, reconciliation and failure report.
    Coverage {
        root: PathBuf,
        /// Output path (default: <output_dir>/coverage-YYYY-MM-DD.pdf)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Use file-name dates only; no statement is parsed
        #[arg(long = "from-filenames")]
        from_filenames: bool,
        #[arg(long)]
        jobs: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::parse_from(["statement-audit", "-vv", "profiles"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Profiles));
    }

    #[test]
    fn test_extract_args() {
        let cli = Cli::parse_from(["statement-audit", "extract", "a.pdf", "--type", "Visa"]);
        match cli.command {
            Commands::Extract { institution, account_type, .. } => {
                assert_eq!(institution, "RBC");
                assert_eq!(account_type, "Visa");
            }
            _ => panic!("expected extract"),
        }
    }
}
