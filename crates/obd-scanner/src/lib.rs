//! obd-scanner - Background OBD polling
//!
//! A [`Scanner`] connects to a diagnostics adapter, polls a list of metrics
//! in round-robin order, converts every reading into a packet and hands it
//! to a recorder.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use obd_conv::ConverterRegistry;
//! use obd_scanner::{transport, Scanner, ScannerConfig};
//! use obd_storage::RecorderRegistry;
//!
//! let config = ScannerConfig::load("obd-influx.json")?;
//! let connector = transport::create_connector(&config.portstr)?;
//! let scanner = Scanner::from_config(
//!     &config,
//!     Arc::new(ConverterRegistry::with_builtins()),
//!     &RecorderRegistry::with_builtins(),
//!     connector,
//! )
//! .await?;
//!
//! scanner.start();
//! tokio::signal::ctrl_c().await?;
//! scanner.shutdown().await?;
//! ```

pub mod config;
pub mod error;
pub mod scanner;
pub mod schedule;
pub mod transport;

pub use config::{check_metrics, ScannerConfig};
pub use error::{ErrorKind, ScanError, ScanResult};
pub use scanner::{ScanStats, Scanner, DEFAULT_FREQUENCY, MAX_FREQUENCY};
pub use schedule::RoundRobin;
