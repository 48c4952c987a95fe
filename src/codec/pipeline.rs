//! Frame conversion pipeline

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use log::debug;
use std::path::Path;

use super::packing::{luma, pack_4bit};
use super::{DEFAULT_HEIGHT, DEFAULT_WIDTH, FRAME_HEADER, SUPPORTED_EXTENSIONS, frame_size};
use crate::config::ImageConfig;
use crate::errors::{ProcessingError, Result};

/// Input formats the decoder accepts
pub const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::WebP,
];

/// Converts arbitrary raster images into frames for a fixed panel size
#[derive(Debug, Clone)]
pub struct ImageCodec {
    width: u32,
    height: u32,
    max_input_bytes: usize,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl ImageCodec {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            max_input_bytes: ImageConfig::default().max_input_bytes,
        }
    }

    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            max_input_bytes: config.max_input_bytes,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn max_input_bytes(&self) -> usize {
        self.max_input_bytes
    }

    /// Size of every frame this codec produces
    pub fn frame_size(&self) -> usize {
        frame_size(self.width, self.height)
    }

    pub fn supported_extensions() -> &'static [&'static str] {
        SUPPORTED_EXTENSIONS
    }

    /// Case-insensitive extension check against [`SUPPORTED_EXTENSIONS`]
    pub fn is_supported_path(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Decode `bytes` and convert them into a frame
    pub fn process(&self, bytes: &[u8]) -> std::result::Result<Vec<u8>, ProcessingError> {
        let (_, img) = self.decode(bytes)?;
        self.render(img)
    }

    /// Read an image file and convert it into a frame
    pub fn process_file(&self, path: &Path) -> Result<Vec<u8>> {
        let bytes = std::fs::read(path)?;
        Ok(self.process(&bytes)?)
    }

    /// Detect the container format and fully decode the pixels
    pub(crate) fn decode(
        &self,
        bytes: &[u8],
    ) -> std::result::Result<(ImageFormat, DynamicImage), ProcessingError> {
        if bytes.len() > self.max_input_bytes {
            return Err(ProcessingError::InputTooLarge {
                size: bytes.len(),
                limit: self.max_input_bytes,
            });
        }

        let format = image::guess_format(bytes)?;
        if !SUPPORTED_FORMATS.contains(&format) {
            return Err(ProcessingError::UnsupportedFormat(format_name(format)));
        }

        let img = image::load_from_memory_with_format(bytes, format)?;
        Ok((format, img))
    }

    /// Run the conversion pipeline on a decoded image
    pub fn render(&self, img: DynamicImage) -> std::result::Result<Vec<u8>, ProcessingError> {
        let (src_width, src_height) = img.dimensions();
        if src_width == 0 || src_height == 0 {
            return Err(ProcessingError::Transform(format!(
                "image has no pixels ({}x{})",
                src_width, src_height
            )));
        }

        // Portrait sources are turned a quarter counter-clockwise
        let img = if src_height > src_width {
            debug!("Rotated portrait image to landscape");
            img.rotate270()
        } else {
            img
        };

        // Crop to the panel aspect in source pixels first so that no
        // intermediate buffer is ever larger than the source or the panel
        let (img_width, img_height) = img.dimensions();
        let (left, top, crop_width, crop_height) = self.source_crop(img_width, img_height);
        let img = if (crop_width, crop_height) != (img_width, img_height) {
            debug!(
                "Cropped image to {}x{} at ({}, {})",
                crop_width, crop_height, left, top
            );
            img.crop_imm(left, top, crop_width, crop_height)
        } else {
            img
        };

        let img = if (crop_width, crop_height) != (self.width, self.height) {
            debug!("Resized image to {}x{}", self.width, self.height);
            img.resize_exact(self.width, self.height, FilterType::Lanczos3)
        } else {
            img
        };

        let samples: Vec<u8> = img
            .to_rgb8()
            .pixels()
            .map(|p| luma(p[0], p[1], p[2]))
            .collect();

        let mut frame = Vec::with_capacity(self.frame_size());
        frame.extend_from_slice(FRAME_HEADER);
        frame.extend(pack_4bit(&samples));

        if frame.len() != self.frame_size() {
            return Err(ProcessingError::Transform(format!(
                "frame is {} bytes, expected {}",
                frame.len(),
                self.frame_size()
            )));
        }

        debug!("Successfully processed image: {} bytes total", frame.len());
        Ok(frame)
    }

    /// Centered region of a `width` x `height` source with the panel's
    /// aspect ratio, as `(left, top, crop_width, crop_height)`.
    ///
    /// Scaling this region to the panel is the same as scaling the whole
    /// source to cover the panel and cropping the overflow equally from both
    /// sides, with odd overflow trimmed toward the origin.
    pub fn source_crop(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let (panel_width, panel_height) = (self.width as u64, self.height as u64);
        let (src_width, src_height) = (width as u64, height as u64);

        if src_width * panel_height >= src_height * panel_width {
            // Wider than the panel: keep the full height
            let crop = (panel_width * src_height + panel_height / 2) / panel_height;
            let crop = crop.clamp(1, src_width) as u32;
            ((width - crop) / 2, 0, crop, height)
        } else {
            let crop = (panel_height * src_width + panel_width / 2) / panel_width;
            let crop = crop.clamp(1, src_height) as u32;
            (0, (height - crop) / 2, width, crop)
        }
    }
}

/// Display name of a container format, e.g. "JPEG"
pub fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}
