//! Error types for recorders

use thiserror::Error;

/// Result type for recorder operations
pub type RecorderResult<T> = Result<T, RecorderError>;

/// Errors raised while building or using a recorder
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Neither an explicit backend name nor a `name` key was given
    #[error("recorder configuration does not specify 'name'")]
    MissingName,

    /// No backend registered under this name
    #[error("no recorder registered with {name}. Available recorders are {available}")]
    UnknownBackend { name: String, available: String },

    /// Backend name registered twice
    #[error("recorder backend already registered: {0}")]
    DuplicateBackend(String),

    /// Backend-specific configuration keys are absent
    #[error("recorder '{backend}' configuration missing keys {keys:?}")]
    MissingKeys {
        backend: String,
        keys: Vec<String>,
    },

    /// Configuration present but malformed
    #[error("invalid recorder configuration: {0}")]
    InvalidConfig(String),

    /// Packet cannot be written by this backend
    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    /// `record` called after `close`
    #[error("recorder is closed")]
    Closed,

    /// Storage service answered with an error status
    #[error("server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl RecorderError {
    /// Whether the error comes from configuration rather than runtime I/O
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            RecorderError::MissingName
                | RecorderError::UnknownBackend { .. }
                | RecorderError::DuplicateBackend(_)
                | RecorderError::MissingKeys { .. }
                | RecorderError::InvalidConfig(_)
                | RecorderError::InvalidUrl(_)
        )
    }
}
