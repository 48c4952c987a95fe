//! Custom error types for pixer

use thiserror::Error;

/// Main error type for pixer operations
#[derive(Debug, Error)]
pub enum PixerError {
    /// The device could not be reached
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    /// The device is reachable but did not behave as expected
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// A frame upload failed part way through
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),
    /// Image decoding or conversion failed
    #[error("Image processing error: {0}")]
    Processing(#[from] ProcessingError),
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures while establishing a session with the device
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(
        "failed to connect to Pixer device at {endpoint} after {attempts} attempts ({last_error})"
    )]
    Unreachable {
        endpoint: String,
        attempts: u32,
        last_error: String,
    },
}

/// Failures in the command/response exchange
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("device not responding to test command")]
    NotResponding,
    #[error("not connected to device")]
    NotConnected,
    #[error("error sending command {command:?}: {message}")]
    Io { command: String, message: String },
}

/// Socket failure during a chunked upload.
///
/// `bytes_sent` counts payload bytes the socket accepted before the fault; the
/// completion sentinel is never considered sent when this error is returned.
#[derive(Debug, Error)]
#[error("upload aborted after {bytes_sent} of {total_bytes} bytes: {message}")]
pub struct TransferError {
    pub bytes_sent: usize,
    pub total_bytes: usize,
    pub message: String,
}

/// Failures while validating or converting an image
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("input is {size} bytes, larger than the {limit} byte limit")]
    InputTooLarge { size: usize, limit: usize },
    #[error("failed to process image: {0}")]
    Transform(String),
}

impl From<serde_json::Error> for PixerError {
    fn from(err: serde_json::Error) -> Self {
        PixerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PixerError {
    fn from(err: toml::de::Error) -> Self {
        PixerError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for PixerError {
    fn from(err: toml::ser::Error) -> Self {
        PixerError::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for ProcessingError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => ProcessingError::UnsupportedFormat(e.to_string()),
            other => ProcessingError::Decode(other.to_string()),
        }
    }
}

/// Result type alias for pixer operations
pub type Result<T> = std::result::Result<T, PixerError>;
