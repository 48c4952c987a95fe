//! Config command implementation

use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::config::AppConfig;

pub fn execute_config_command(output: Option<PathBuf>, force: bool) -> Result<()> {
    let path = output.unwrap_or_else(AppConfig::default_path);

    if path.exists() && !force {
        bail!(
            "Configuration file '{}' already exists (use --force to overwrite)",
            path.display()
        );
    }

    AppConfig::default().save(&path)?;

    println!("✅ Generated default configuration file: {}", path.display());
    println!("ℹ️  Edit it to point pixer at a different device or panel size.");
    Ok(())
}
