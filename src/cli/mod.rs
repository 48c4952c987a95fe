//! Command Line Interface module
//!
//! Thin wrapper over the service layer: argument parsing, logging setup and
//! human-readable (or JSON) output of operation results.

pub mod args;
pub mod commands;

pub use args::*;

use anyhow::Result;

use crate::utils::logging;

/// Main CLI application runner
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => logging::init_structured_logging(
            logging::level_for(cli.verbose, cli.quiet),
            path.to_str(),
        )?,
        None => logging::init_cli_logging(cli.verbose, cli.quiet)?,
    }

    commands::execute_command(cli.command.clone(), &cli).await
}
