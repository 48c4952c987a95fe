//! Data models and types used throughout pixer

pub mod device;
pub mod image;
pub mod operation;

// Re-export commonly used types
pub use device::*;
pub use image::*;
pub use operation::*;
