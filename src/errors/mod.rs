//! Error handling for pixer

pub mod types;

pub use types::*;
