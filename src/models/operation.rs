//! Operation result records delivered by the orchestrator

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::device::DeviceInfo;
use super::image::{ImageInfo, UploadInfo};

/// Stage of an upload operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStage {
    Starting,
    Validating,
    Processing,
    Connecting,
    Uploading,
    Complete,
    Error,
}

impl UploadStage {
    /// Progress reported when the stage begins
    pub fn progress(&self) -> u8 {
        match self {
            UploadStage::Starting | UploadStage::Error => 0,
            UploadStage::Validating => 10,
            UploadStage::Processing => 30,
            UploadStage::Connecting => 50,
            UploadStage::Uploading => 70,
            UploadStage::Complete => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::Starting => "starting",
            UploadStage::Validating => "validating",
            UploadStage::Processing => "processing",
            UploadStage::Connecting => "connecting",
            UploadStage::Uploading => "uploading",
            UploadStage::Complete => "complete",
            UploadStage::Error => "error",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress notification emitted at the start of every upload stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub stage: UploadStage,
    pub progress: u8,
}

impl From<UploadStage> for UploadProgress {
    fn from(stage: UploadStage) -> Self {
        Self {
            stage,
            progress: stage.progress(),
        }
    }
}

/// Result of a device check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub success: bool,
    pub timestamp: DateTime<Local>,
    pub device_info: DeviceInfo,
    pub error: Option<String>,
}

/// Result of a device reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResult {
    pub success: bool,
    pub timestamp: DateTime<Local>,
    pub error: Option<String>,
}

/// Result of an image upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    pub success: bool,
    pub timestamp: DateTime<Local>,
    pub image_info: Option<ImageInfo>,
    pub upload_info: Option<UploadInfo>,
    pub error: Option<String>,
    /// Last stage entered; on failure, the stage that failed
    pub stage: UploadStage,
}

/// Cache-only view of the device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub success: bool,
    pub device_info: Option<DeviceInfo>,
    pub cached: bool,
    pub age_seconds: Option<f64>,
    pub error: Option<String>,
}

impl CheckResult {
    pub fn new() -> Self {
        Self {
            success: false,
            timestamp: Local::now(),
            device_info: DeviceInfo::default(),
            error: None,
        }
    }
}

impl ResetResult {
    pub fn new() -> Self {
        Self {
            success: false,
            timestamp: Local::now(),
            error: None,
        }
    }
}

impl UploadResult {
    pub fn new() -> Self {
        Self {
            success: false,
            timestamp: Local::now(),
            image_info: None,
            upload_info: None,
            error: None,
            stage: UploadStage::Starting,
        }
    }
}

impl Default for CheckResult {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ResetResult {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for UploadResult {
    fn default() -> Self {
        Self::new()
    }
}
