//! Conversion of raster images into Pixer frames
//!
//! A frame is the ASCII header followed by the picture as 4-bit grayscale,
//! row-major, two pixels per byte with the first pixel in the low nibble.

pub mod packing;
pub mod pipeline;
pub mod validation;

pub use packing::{luma, pack_4bit};
pub use pipeline::*;

/// Native panel resolution
pub const DEFAULT_WIDTH: u32 = 1872;
pub const DEFAULT_HEIGHT: u32 = 1404;

/// Prepended verbatim to every frame
pub const FRAME_HEADER: &[u8] = b"#file#000801314144imagebin";

/// Extensions of the accepted input formats
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".bmp", ".tiff", ".tif", ".webp",
];

/// Exact size of a frame for a `width` x `height` panel
pub fn frame_size(width: u32, height: u32) -> usize {
    let pixels = width as usize * height as usize;
    FRAME_HEADER.len() + pixels.div_ceil(2)
}
