//! Application configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{PixerError, Result};
use crate::models::DeviceEndpoint;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Device endpoint and transport tuning
    pub device: DeviceConfig,
    /// Frame conversion settings
    pub image: ImageConfig,
    /// Worker pool and cache settings
    pub service: ServiceConfig,
}

/// Device connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub host: String,
    pub port: u16,
    /// Connection attempts before giving up
    pub connect_attempts: u32,
    /// Delay between connection attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Per-attempt connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Per-read timeout while waiting for a command response
    pub read_timeout_ms: u64,
    /// Bounded reads per command before reporting "no response"
    pub command_retries: u32,
    /// I/O timeout applied for the duration of a frame upload
    pub upload_timeout_ms: u64,
    /// Upload chunk size in bytes
    pub chunk_size: usize,
}

/// Frame conversion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
    /// Largest raw input accepted by the validator
    pub max_input_bytes: usize,
}

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Concurrent operations allowed in the worker pool
    pub workers: usize,
    /// Lifetime of a cached device-info snapshot in seconds
    pub cache_ttl_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: crate::protocol::DEFAULT_HOST.to_string(),
            port: crate::protocol::DEFAULT_PORT,
            connect_attempts: 10,
            retry_delay_ms: 2000,
            connect_timeout_ms: 2000,
            read_timeout_ms: 2000,
            command_retries: 5,
            upload_timeout_ms: 10_000,
            chunk_size: crate::protocol::DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: crate::codec::DEFAULT_WIDTH,
            height: crate::codec::DEFAULT_HEIGHT,
            max_input_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            cache_ttl_secs: 30,
        }
    }
}

impl DeviceConfig {
    pub fn endpoint(&self) -> DeviceEndpoint {
        DeviceEndpoint::new(self.host.clone(), self.port)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }
}

impl ServiceConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl AppConfig {
    /// Default location of the configuration file (`<config dir>/pixer/config.toml`)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::APP_NAME)
            .join("config.toml")
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PixerError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise the default location if it exists,
    /// otherwise built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Write this configuration as pretty TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.image.width == 0 || self.image.height == 0 {
            return Err(PixerError::Config(format!(
                "frame dimensions must be non-zero, got {}x{}",
                self.image.width, self.image.height
            )));
        }
        if self.service.workers == 0 {
            return Err(PixerError::Config(
                "worker pool needs at least one worker".to_string(),
            ));
        }
        if self.device.chunk_size == 0 {
            return Err(PixerError::Config("chunk_size must be non-zero".to_string()));
        }
        if self.device.connect_attempts == 0 {
            return Err(PixerError::Config(
                "connect_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
