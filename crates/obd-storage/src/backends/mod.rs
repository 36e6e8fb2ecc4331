//! Built-in recorder backends

pub mod influxdb;
pub mod memory;

pub use influxdb::{InfluxDbFactory, InfluxDbRecorder, InfluxDbSettings};
pub use memory::{MemoryRecorder, MemoryRecorderFactory};
