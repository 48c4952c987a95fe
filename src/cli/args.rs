//! Command line argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(name = "pixer")]
#[command(about = "🖼️  Pixer E-Ink photo frame tool - check, reset and upload images")]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/pixer/config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Device address, overrides the configuration file
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Device TCP port, overrides the configuration file
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease logging verbosity (only errors)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Write JSON structured logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Query battery level and firmware versions
    Check,
    /// Send the reset command to the device
    Reset,
    /// Convert an image and upload it to the frame
    Upload {
        /// Image file (jpg, png, bmp, tiff or webp)
        image: PathBuf,
    },
    /// Validate an image without converting it
    Info {
        /// Image file to inspect
        image: PathBuf,
    },
    /// Convert an image into a frame file without a device
    Convert {
        /// Source image file
        image: PathBuf,
        /// Where to write the frame
        #[arg(short, long, default_value = "frame.bin")]
        output: PathBuf,
    },
    /// Write a default configuration file
    Config {
        /// Destination (defaults to <config dir>/pixer/config.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_with_overrides() {
        let cli = Cli::try_parse_from([
            "pixer", "--host", "10.0.0.9", "--port", "6001", "-vv", "upload", "cat.jpg",
        ])
        .expect("valid arguments");

        assert_eq!(cli.host.as_deref(), Some("10.0.0.9"));
        assert_eq!(cli.port, Some(6001));
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_file.is_none());
        match cli.command {
            Commands::Upload { image } => assert_eq!(image, PathBuf::from("cat.jpg")),
            other => panic!("Expected upload command, got: {:?}", other),
        }
    }

    #[test]
    fn test_convert_default_output() {
        let cli = Cli::try_parse_from(["pixer", "convert", "cat.png"]).expect("valid arguments");
        match cli.command {
            Commands::Convert { output, .. } => assert_eq!(output, PathBuf::from("frame.bin")),
            other => panic!("Expected convert command, got: {:?}", other),
        }
    }

    #[test]
    fn test_log_file_is_global() {
        let cli = Cli::try_parse_from(["pixer", "check", "--log-file", "/tmp/pixer.log"])
            .expect("valid arguments");
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/pixer.log")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["pixer"]).is_err());
    }

    #[test]
    fn test_documented_subcommands() {
        for name in ["check", "reset", "info", "config"] {
            let args: &[&str] = match name {
                "info" => &["pixer", "info", "cat.png"],
                _ => &["pixer", name],
            };
            assert!(Cli::try_parse_from(args).is_ok(), "{} should parse", name);
        }
        assert!(Cli::try_parse_from(["pixer", "status"]).is_err());
    }
}
