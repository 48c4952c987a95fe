//! pixer - Pixer E-Ink photo frame toolkit
//!
//! Talks to a Pixer frame over its TCP command channel, converts ordinary
//! photos into the frame's packed 4-bit grayscale format and uploads them.
//! Front ends drive everything through [`services::DeviceOrchestrator`].

pub mod cli;
pub mod codec;
pub mod config;
pub mod errors;
pub mod models;
pub mod protocol;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use codec::ImageCodec;
pub use config::AppConfig;
pub use errors::*;
pub use models::*;
pub use protocol::ProtocolClient;
pub use services::{DeviceOrchestrator, OperationHandle};

/// pixer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// pixer application name
pub const APP_NAME: &str = "pixer";
