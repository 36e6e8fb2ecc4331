//! obd-core - Core traits and types for OBD-II metric scanning
//!
//! This crate provides the shared vocabulary of the workspace: the closed
//! metric catalog, typed device readings, and the device traits that a
//! diagnostics adapter implements.

pub mod catalog;
pub mod device;
pub mod error;
pub mod models;

pub use catalog::{Metric, MetricInfo, ValueKind};
pub use device::{DeviceConnector, DevicePort, ObdDevice};
pub use error::{DeviceError, DeviceResult, UnknownMetric};
pub use models::{unix_seconds, MonitorStatus, Response, ResponseValue};
