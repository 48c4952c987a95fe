//! Non-mutating pre-flight checks on raw image input

use image::DynamicImage;
use std::path::Path;

use super::pipeline::{ImageCodec, format_name};
use crate::models::ImageInfo;

impl ImageCodec {
    /// Inspect raw bytes without converting them.
    ///
    /// The pixels are fully decoded so that truncated or corrupt data is
    /// reported as invalid here rather than half way through an upload.
    pub fn validate(&self, bytes: &[u8]) -> ImageInfo {
        self.inspect(bytes).0
    }

    /// Validate `bytes` and hand back the decoded image for a later
    /// [`ImageCodec::render`]
    pub fn inspect(&self, bytes: &[u8]) -> (ImageInfo, Option<DynamicImage>) {
        let mut info = ImageInfo {
            size_bytes: Some(bytes.len() as u64),
            ..Default::default()
        };

        match self.decode(bytes) {
            Ok((format, img)) => {
                info.valid = true;
                info.width = Some(img.width());
                info.height = Some(img.height());
                info.format = Some(format_name(format));
                info.mode = Some(format!("{:?}", img.color()));
                (info, Some(img))
            }
            Err(e) => {
                info.error = Some(e.to_string());
                (info, None)
            }
        }
    }

    /// Inspect an image file; `size_bytes` comes from the file metadata
    pub fn image_info_file(&self, path: &Path) -> ImageInfo {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ImageInfo {
                    error: Some("File not found".to_string()),
                    ..Default::default()
                };
            }
            Err(e) => {
                return ImageInfo {
                    error: Some(e.to_string()),
                    ..Default::default()
                };
            }
        };

        let mut info = self.validate(&bytes);
        if let Ok(metadata) = std::fs::metadata(path) {
            info.size_bytes = Some(metadata.len());
        }
        info
    }
}
