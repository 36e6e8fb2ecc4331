//! Common error types for OBD devices

use thiserror::Error;

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// A metric name that is not part of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown OBD command: {0}")]
pub struct UnknownMetric(pub String);

/// Errors raised by a diagnostics device
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    /// Device could not be opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query attempted on a closed connection
    #[error("Device not connected")]
    NotConnected,

    /// Adapter answered with something undecodable
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No driver for the requested port
    #[error("Device not supported: {0}")]
    Unsupported(String),
}
