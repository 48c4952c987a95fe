//! Device commands: check, reset and upload

use anyhow::{Result, bail};
use std::path::PathBuf;
use std::sync::Arc;

use super::{load_config, print_json};
use crate::cli::args::Cli;
use crate::codec::ImageCodec;
use crate::models::{DeviceInfo, UploadProgress};
use crate::services::{DeviceOrchestrator, ProgressCallback};

pub async fn execute_check_command(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let service = DeviceOrchestrator::new(&config)?;

    if !cli.json {
        println!("🔍 Checking Pixer device at {}...", service.endpoint());
    }
    let result = service.check_device().await;
    service.shutdown().await;

    if cli.json {
        print_json(&result)?;
    } else if result.success {
        println!("✅ Device is online");
        print_device_info(&result.device_info);
    } else {
        println!(
            "❌ Device check failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    if !result.success {
        bail!("device check failed");
    }
    Ok(())
}

pub async fn execute_reset_command(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let service = DeviceOrchestrator::new(&config)?;

    if !cli.json {
        println!("🔄 Resetting Pixer device at {}...", service.endpoint());
    }
    let result = service.reset_device().await;
    service.shutdown().await;

    if cli.json {
        print_json(&result)?;
    } else if result.success {
        println!("✅ Reset command sent");
    } else {
        println!(
            "❌ Reset failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    if !result.success {
        bail!("device reset failed");
    }
    Ok(())
}

pub async fn execute_upload_command(cli: &Cli, image: PathBuf) -> Result<()> {
    if !ImageCodec::is_supported_path(&image) {
        bail!(
            "Unsupported file format. Supported: {}",
            ImageCodec::supported_extensions().join(", ")
        );
    }

    let config = load_config(cli)?;
    let service = DeviceOrchestrator::new(&config)?;

    let on_progress: Option<ProgressCallback> = if cli.json {
        None
    } else {
        println!(
            "📤 Uploading {} to {}...",
            image.display(),
            service.endpoint()
        );
        Some(Arc::new(|progress: UploadProgress| {
            println!("   [{:>3}%] {}", progress.progress, progress.stage);
        }))
    };

    let result = service.upload_image_file(image, on_progress).await;
    service.shutdown().await;

    if cli.json {
        print_json(&result)?;
    } else if result.success {
        let sent = result.upload_info.as_ref().map_or(0, |u| u.bytes_sent);
        println!("✅ Upload complete ({} bytes)", sent);
    } else {
        println!(
            "❌ Upload failed at stage '{}': {}",
            result.stage,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    if !result.success {
        bail!("upload failed");
    }
    Ok(())
}

fn print_device_info(info: &DeviceInfo) {
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!(
        "   🔋 Battery: {}",
        info.battery_level
            .as_ref()
            .map_or_else(|| "-".to_string(), |b| b.to_string())
    );
    println!("   📡 BLE firmware: {}", show(&info.ble_version));
    println!("   🖥️  ITE firmware: {}", show(&info.ite_version));
    println!("   ⚙️  MCU firmware: {}", show(&info.mcu_version));
}
