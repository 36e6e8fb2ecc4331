//! obd-storage - Pluggable time-series recorders
//!
//! Recorders receive finished [`Packet`](obd_conv::Packet)s and store them.
//! Backends are looked up by name in a [`RecorderRegistry`] and built from
//! the `recorder` section of the scanner configuration.
//!
//! # Example
//!
//! ```ignore
//! use obd_storage::RecorderRegistry;
//! use serde_json::json;
//!
//! let registry = RecorderRegistry::with_builtins();
//! let config = json!({
//!     "name": "influxdb",
//!     "host": "localhost",
//!     "port": 8086,
//!     "database": "obd",
//!     "username": "admin",
//!     "password": "admin"
//! });
//! let recorder = registry.create(None, config.as_object().unwrap()).await?;
//! recorder.record(&packet).await?;
//! recorder.close().await?;
//! ```

pub mod backends;
pub mod error;
pub mod line_protocol;
pub mod recorder;
pub mod registry;

pub use backends::{InfluxDbFactory, InfluxDbRecorder, MemoryRecorder, MemoryRecorderFactory};
pub use error::{RecorderError, RecorderResult};
pub use recorder::{settings_from_config, Recorder, RecorderConfig, RecorderFactory};
pub use registry::RecorderRegistry;
