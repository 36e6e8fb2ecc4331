//! Recorder traits - the storage plugin contract

use std::sync::Arc;

use async_trait::async_trait;
use obd_conv::Packet;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{RecorderError, RecorderResult};

/// Backend-specific recorder configuration (the `recorder` section)
pub type RecorderConfig = Map<String, Value>;

/// A storage sink for packets
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Backend name this recorder was built from
    fn backend(&self) -> &str;

    /// Store one packet
    async fn record(&self, packet: &Packet) -> RecorderResult<()>;

    /// Release persistent connections
    ///
    /// Built-in backends tolerate repeated calls.
    async fn close(&self) -> RecorderResult<()>;

    /// Check that the storage service is reachable
    ///
    /// Returns a short description of the service, or `None` when the
    /// backend has nothing to check.
    async fn ping(&self) -> RecorderResult<Option<String>> {
        Ok(None)
    }
}

/// Builds recorders of one backend from configuration
#[async_trait]
pub trait RecorderFactory: Send + Sync {
    /// Keys that must be present in the configuration
    fn required_keys(&self) -> &[&'static str] {
        &[]
    }

    /// Construct a recorder
    async fn create(&self, config: &RecorderConfig) -> RecorderResult<Arc<dyn Recorder>>;
}

/// Deserialize backend settings from the configuration map
///
/// Unknown keys (including `name`) are ignored.
pub fn settings_from_config<T: DeserializeOwned>(config: &RecorderConfig) -> RecorderResult<T> {
    serde_json::from_value(Value::Object(config.clone()))
        .map_err(|e| RecorderError::InvalidConfig(e.to_string()))
}
