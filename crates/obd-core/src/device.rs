//! Device traits - the seam between the scanner and a diagnostics adapter

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::Metric;
use crate::error::DeviceResult;
use crate::models::Response;

/// Address of a diagnostics adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePort {
    /// Serial port path or connector-specific address (e.g. "/dev/ttyUSB0")
    pub portstr: String,
    /// Serial baud rate
    pub baudrate: u32,
}

impl DevicePort {
    pub fn new(portstr: impl Into<String>, baudrate: u32) -> Self {
        Self {
            portstr: portstr.into(),
            baudrate,
        }
    }
}

impl std::fmt::Display for DevicePort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {} baud", self.portstr, self.baudrate)
    }
}

/// An open connection to a diagnostics adapter
///
/// Implementations decode the wire protocol; the scanner only sees typed
/// readings.
#[async_trait]
pub trait ObdDevice: Send + Sync {
    /// Request one reading
    ///
    /// `Ok(None)` is a null reading (no data or adapter timeout). There is no
    /// caller-side timeout: a hung query blocks until the device returns.
    async fn query(&self, metric: Metric) -> DeviceResult<Option<Response>>;

    /// Whether the connection is currently open
    fn is_connected(&self) -> bool;

    /// Close the connection
    async fn close(&self);
}

/// Opens device connections
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    /// Open a connection to the adapter at `port`
    async fn connect(&self, port: &DevicePort) -> DeviceResult<Arc<dyn ObdDevice>>;
}
