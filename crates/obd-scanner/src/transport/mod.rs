//! Device connectors
//!
//! Only the simulated adapter is built in; serial adapters plug in through
//! [`obd_core::DeviceConnector`].
//!
//! # Example
//!
//! ```ignore
//! use obd_scanner::transport::create_connector;
//! use obd_core::DevicePort;
//!
//! let connector = create_connector("mock:")?;
//! let device = connector.connect(&DevicePort::new("mock:", 38400)).await?;
//! ```

pub mod mock;

use std::sync::Arc;

use obd_core::{DeviceConnector, DeviceError, DeviceResult};

pub use mock::{MockConfig, MockConnector, MockDevice};

/// Port prefix selecting the simulated adapter
pub const MOCK_SCHEME: &str = "mock:";

/// Create a connector for a port string
pub fn create_connector(portstr: &str) -> DeviceResult<Arc<dyn DeviceConnector>> {
    match portstr.strip_prefix(MOCK_SCHEME) {
        Some(options) => Ok(Arc::new(MockConnector::new(&parse_mock_options(options)?))),
        None => Err(DeviceError::Unsupported(format!(
            "no built-in driver for {}; use a '{}' port or supply a DeviceConnector",
            portstr, MOCK_SCHEME
        ))),
    }
}

/// Parse `latency_ms=N` style options following `mock:`
fn parse_mock_options(options: &str) -> DeviceResult<MockConfig> {
    let mut config = MockConfig::default();
    for option in options.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        match option.split_once('=') {
            Some(("latency_ms", value)) => {
                config.latency_ms = value.parse().map_err(|_| {
                    DeviceError::ConnectionFailed(format!("invalid mock latency: {}", value))
                })?;
            }
            _ => {
                return Err(DeviceError::ConnectionFailed(format!(
                    "unknown mock option: {}",
                    option
                )))
            }
        }
    }
    Ok(config)
}
