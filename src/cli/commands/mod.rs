//! CLI command implementations

pub mod config;
pub mod device;
pub mod frame;

use crate::cli::args::{Cli, Commands};
use crate::config::AppConfig;
use anyhow::Result;
use serde::Serialize;

/// Execute a CLI command
pub async fn execute_command(command: Commands, cli: &Cli) -> Result<()> {
    match command {
        Commands::Check => device::execute_check_command(cli).await,
        Commands::Reset => device::execute_reset_command(cli).await,
        Commands::Upload { image } => device::execute_upload_command(cli, image).await,
        Commands::Info { image } => frame::execute_info_command(cli, image),
        Commands::Convert { image, output } => {
            frame::execute_convert_command(cli, image, output).await
        }
        Commands::Config { output, force } => config::execute_config_command(output, force),
    }
}

/// Load the configuration and apply command line overrides
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(host) = &cli.host {
        config.device.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.device.port = port;
    }
    Ok(config)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
