//! Error types for packet construction and conversion

use obd_core::UnknownMetric;
use thiserror::Error;

/// Errors that can occur while building or converting packets
#[derive(Debug, Error)]
pub enum ConvError {
    /// Name is not part of the metric catalog
    #[error("obd command has no command {0}")]
    UnknownMetric(String),

    /// Builder used before `start`
    #[error("packet not started with start()")]
    NotStarted,

    /// `serialize` called before `add_timestamp`
    #[error("packet was not timestamped with add_timestamp()")]
    NotTimestamped,

    /// `serialize` called before any field was added
    #[error("packet has no fields added with add_fields()")]
    NoFields,

    /// Parallel name/value lists of different lengths
    #[error("different numbers of {kind} and values ({names} names, {values} values)")]
    LengthMismatch {
        kind: &'static str,
        names: usize,
        values: usize,
    },

    /// Timestamp that cannot be represented in nanoseconds
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(f64),

    /// A converter is already registered for this metric
    #[error("converter already registered for command {0}")]
    DuplicateConverter(String),

    /// No converter is registered for this metric
    #[error("no converter registered for command {0}")]
    NoConverter(String),

    /// Metric kind the converters cannot flatten into one record
    #[error("unsupported multi-valued metric {0}: multi-measurement commands not supported yet")]
    Unsupported(String),

    /// Reading does not carry the value shape the converter expects
    #[error("invalid value for {metric}: {reason}")]
    InvalidValue { metric: String, reason: String },

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<UnknownMetric> for ConvError {
    fn from(err: UnknownMetric) -> Self {
        ConvError::UnknownMetric(err.0)
    }
}

/// Result type for conversion operations
pub type ConvResult<T> = Result<T, ConvError>;
