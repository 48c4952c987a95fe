//! Image validation and upload bookkeeping models

use serde::{Deserialize, Serialize};

/// Validator output for raw image bytes or an image file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub valid: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Declared container format, e.g. "JPEG"
    pub format: Option<String>,
    /// Color layout of the decoded pixels, e.g. "Rgb8"
    pub mode: Option<String>,
    pub size_bytes: Option<u64>,
    pub error: Option<String>,
}

/// Outcome of the transfer step of an upload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadInfo {
    pub success: bool,
    pub bytes_sent: usize,
    pub total_bytes: usize,
    pub error: Option<String>,
}
