//! Device-related data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed TCP endpoint of a Pixer frame
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
}

impl DeviceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for DeviceEndpoint {
    fn default() -> Self {
        Self::new(crate::protocol::DEFAULT_HOST, crate::protocol::DEFAULT_PORT)
    }
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Battery reading as reported by the device.
///
/// Firmware normally answers with a decimal percentage; anything else is kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatteryLevel {
    Integer(i64),
    Raw(String),
}

impl BatteryLevel {
    pub fn parse(response: &str) -> Self {
        match response.trim().parse::<i64>() {
            Ok(level) => BatteryLevel::Integer(level),
            Err(_) => BatteryLevel::Raw(response.to_string()),
        }
    }
}

impl fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatteryLevel::Integer(level) => write!(f, "{}%", level),
            BatteryLevel::Raw(raw) => write!(f, "{}", raw),
        }
    }
}

/// Snapshot of the device state returned by a status query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub connected: bool,
    pub battery_level: Option<BatteryLevel>,
    pub ble_version: Option<String>,
    pub ite_version: Option<String>,
    pub mcu_version: Option<String>,
    pub error: Option<String>,
}
