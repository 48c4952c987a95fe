//! Utility functions and helpers used throughout pixer

pub mod logging;
