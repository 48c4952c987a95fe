//! Pixer wire protocol
//!
//! The frame listens on a fixed TCP endpoint and speaks a tiny undelimited
//! ASCII command set. Frames are pushed as raw binary chunks followed by a
//! text sentinel.

pub mod client;
pub mod connector;

pub use client::*;
pub use connector::*;

/// Default device address when the frame acts as its own access point
pub const DEFAULT_HOST: &str = "192.168.1.1";
pub const DEFAULT_PORT: u16 = 6000;
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Liveness probe and the literal answer a healthy device sends back
pub const TEST_COMMAND: &[u8] = b"#TEST#";
pub const TEST_RESPONSE: &str = "Hello PC!";

pub const BATTERY_LEVEL_COMMAND: &[u8] = b"batteryLevel";
pub const BLE_VERSION_COMMAND: &[u8] = b"bleVersion";
pub const ITE_VERSION_COMMAND: &[u8] = b"iteVersion";
pub const MCU_VERSION_COMMAND: &[u8] = b"mcuVersion";
pub const RESET_COMMAND: &[u8] = b"reset";

/// Written after the last frame chunk; the device detects end-of-frame by it
pub const UPLOAD_SENTINEL: &[u8] = b"#MOVE#d";

/// Size of a single response read
pub const RESPONSE_BUFFER_SIZE: usize = 64;
