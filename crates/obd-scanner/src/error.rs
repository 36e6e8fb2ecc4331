//! Scanner errors

use obd_conv::ConvError;
use obd_core::DeviceError;
use obd_storage::RecorderError;
use thiserror::Error;

/// Result type for scanner operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors surfaced by the scanner and its configuration
#[derive(Debug, Error)]
pub enum ScanError {
    /// Malformed or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Device could not be opened or used
    #[error("Connection error: {0}")]
    Connection(#[from] DeviceError),

    /// Value rejected at the call site
    #[error("Validation error: {0}")]
    Validation(String),

    /// Packet construction or converter dispatch failed
    #[error(transparent)]
    Conversion(#[from] ConvError),

    /// Recorder construction or I/O failed
    #[error(transparent)]
    Recorder(#[from] RecorderError),
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad configuration, fatal to startup
    Configuration,
    /// Device unreachable
    Connection,
    /// Rejected argument; prior state untouched
    Validation,
    /// No converter, or the converter refused the reading
    Dispatch,
    /// Storage backend failed at runtime
    Recorder,
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::Config(_) | ScanError::ConfigIo { .. } => ErrorKind::Configuration,
            ScanError::Connection(_) => ErrorKind::Connection,
            ScanError::Validation(_) => ErrorKind::Validation,
            ScanError::Conversion(err) => match err {
                ConvError::UnknownMetric(_) | ConvError::DuplicateConverter(_) => {
                    ErrorKind::Configuration
                }
                ConvError::NotStarted
                | ConvError::NotTimestamped
                | ConvError::NoFields
                | ConvError::LengthMismatch { .. }
                | ConvError::InvalidTimestamp(_) => ErrorKind::Validation,
                _ => ErrorKind::Dispatch,
            },
            ScanError::Recorder(err) if err.is_config() => ErrorKind::Configuration,
            ScanError::Recorder(_) => ErrorKind::Recorder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            ScanError::Config("no commands provided".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ScanError::from(DeviceError::ConnectionFailed("x".into())).kind(),
            ErrorKind::Connection
        );
        assert_eq!(ScanError::from(ConvError::NoFields).kind(), ErrorKind::Validation);
        assert_eq!(
            ScanError::from(ConvError::Unsupported("GET_DTC".into())).kind(),
            ErrorKind::Dispatch
        );
        assert_eq!(
            ScanError::from(ConvError::DuplicateConverter("RPM".into())).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ScanError::from(RecorderError::MissingName).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ScanError::from(RecorderError::Closed).kind(),
            ErrorKind::Recorder
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ScanError::Config("no commands provided".into()).to_string(),
            "Configuration error: no commands provided"
        );
        assert_eq!(
            ScanError::from(RecorderError::Closed).to_string(),
            "recorder is closed"
        );
    }
}
