//! Device operations service layer
//!
//! [`DeviceOrchestrator`] is the entry point used by front ends: it runs
//! check / reset / upload operations on a bounded worker pool and hands back
//! [`OperationHandle`]s that always resolve to a result record.

pub mod cache;
pub mod device_service;
pub mod handle;

pub use cache::*;
pub use device_service::*;
pub use handle::*;
