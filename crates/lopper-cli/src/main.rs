//! lopper CLI
//!
//! Resolves and prints the effective dependency policy of a repository.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| CliError::user(format!("failed to set tracing subscriber: {e}")))?;
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Resolve { policy, json } => commands::run_resolve(&policy, json),
        Commands::Validate { policy } => commands::run_validate(&policy),
    }
}
