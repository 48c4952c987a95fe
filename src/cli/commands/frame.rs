//! Offline image commands: info and convert

use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use super::{load_config, print_json};
use crate::cli::args::Cli;
use crate::codec::ImageCodec;

pub fn execute_info_command(cli: &Cli, image: PathBuf) -> Result<()> {
    let config = load_config(cli)?;
    let codec = ImageCodec::from_config(&config.image);
    let info = codec.image_info_file(&image);

    if cli.json {
        print_json(&info)?;
    } else if info.valid {
        println!("✅ {} is a valid image", image.display());
        println!(
            "   📐 {}x{} {} ({})",
            info.width.unwrap_or(0),
            info.height.unwrap_or(0),
            info.format.as_deref().unwrap_or("?"),
            info.mode.as_deref().unwrap_or("?")
        );
        println!("   💾 {} bytes", info.size_bytes.unwrap_or(0));
    } else {
        println!(
            "❌ {} is not usable: {}",
            image.display(),
            info.error.as_deref().unwrap_or("unknown error")
        );
    }

    if !info.valid {
        bail!("invalid image");
    }
    Ok(())
}

pub async fn execute_convert_command(cli: &Cli, image: PathBuf, output: PathBuf) -> Result<()> {
    let config = load_config(cli)?;
    let codec = ImageCodec::from_config(&config.image);

    let source = image.clone();
    let frame = tokio::task::spawn_blocking(move || codec.process_file(&source))
        .await
        .context("conversion task failed")?
        .with_context(|| format!("failed to convert {}", image.display()))?;

    tokio::fs::write(&output, &frame)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    if !cli.quiet {
        println!(
            "✅ Wrote {} byte frame to {}",
            frame.len(),
            output.display()
        );
    }
    Ok(())
}
