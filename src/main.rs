mod aggregator;
mod cli;
mod document;
mod error;
mod export;
mod extractor;
mod fmt;
mod gaps;
mod loader;
mod metadata;
mod models;
#[cfg(feature = "pdf")]
mod pdf;
mod pdftext;
mod pipeline;
mod profiles;
mod settings;
mod standardizer;
mod validator;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "pdf")]
use cli::ExportCommands;
use cli::{Cli, Commands};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("statement_audit={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init {
            output_dir,
            format,
            jobs,
            institutions,
            keep_unreconciled,
        } => cli::init::run(output_dir, format, jobs, institutions, keep_unreconciled),
        Commands::Scan {
            root,
            output,
            format,
            jobs,
            keep_unreconciled,
            json,
        } => cli::scan::run(cli::scan::ScanArgs {
            root,
            output,
            format,
            jobs,
            keep_unreconciled,
            json,
        }),
        Commands::Extract {
            file,
            institution,
            account_type,
            json,
        } => cli::extract::run(&file, &institution, &account_type, json),
        Commands::Gaps { root, json } => cli::gaps::run(&root, json),
        Commands::Profiles => cli::profiles::run(),
        Commands::Completions { shell } => cli::completions::run(shell),
        #[cfg(feature = "pdf")]
        Commands::Export { command } => match command {
            ExportCommands::Coverage {
                root,
                output,
                from_filenames,
                jobs,
            } => cli::export::coverage(&root, output, from_filenames, jobs).map(|_| ()),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
