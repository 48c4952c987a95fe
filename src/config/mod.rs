//! Configuration management for pixer

pub mod app_config;

pub use app_config::*;
