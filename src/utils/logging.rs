//! Logging utilities and initialization for pixer

use anyhow::Result;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;

/// Map `-q` / `-v` flags to a level filter
pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Initialize human-readable stderr logging for the CLI
pub fn init_cli_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = level_for(verbose, quiet);

    Builder::from_default_env()
        .target(Target::Stderr)
        .filter_level(level)
        .format_timestamp_secs()
        .format_module_path(false)
        .try_init()?;

    log_panics::init();

    log::debug!("pixer logging initialized with level: {:?}", level);
    Ok(())
}

/// Initialize JSON structured logging, one object per line, to `log_file` or stdout
pub fn init_structured_logging(level: LevelFilter, log_file: Option<&str>) -> Result<()> {
    use std::fs::OpenOptions;

    let target: Box<dyn Write + Send> = if let Some(file_path) = log_file {
        Box::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?,
        )
    } else {
        Box::new(std::io::stdout())
    };

    Builder::from_default_env()
        .target(Target::Pipe(target))
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "{}", json_line(record)))
        .try_init()?;

    log_panics::init();

    log::info!(
        "pixer structured logging initialized with level: {:?}",
        level
    );
    Ok(())
}

fn json_line(record: &log::Record<'_>) -> serde_json::Value {
    serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "level": record.level().to_string(),
        "module": record.module_path().unwrap_or("unknown"),
        "message": record.args().to_string(),
        "target": record.target(),
    })
}
