//! Recorder registry - maps backend names to factories

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::backends::{InfluxDbFactory, MemoryRecorderFactory};
use crate::error::{RecorderError, RecorderResult};
use crate::recorder::{Recorder, RecorderConfig, RecorderFactory};

/// Table of recorder backends
///
/// Populated at startup and read afterwards; registration takes `&mut self`
/// so lookups never race with it.
#[derive(Default)]
pub struct RecorderRegistry {
    factories: HashMap<String, Arc<dyn RecorderFactory>>,
}

impl RecorderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in backends (`influxdb`, `memory`)
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(
            InfluxDbFactory::NAME.to_string(),
            Arc::new(InfluxDbFactory),
        );
        registry.factories.insert(
            MemoryRecorderFactory::NAME.to_string(),
            Arc::new(MemoryRecorderFactory::new()),
        );
        registry
    }

    /// Register a backend
    ///
    /// A name can only be registered once.
    pub fn register_backend(
        &mut self,
        name: impl Into<String>,
        factory: Arc<dyn RecorderFactory>,
    ) -> RecorderResult<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RecorderError::DuplicateBackend(name));
        }
        info!(backend = %name, "Registering recorder backend");
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Registered backend names, sorted
    pub fn backends(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolve the backend name from an explicit name or the config's `name`
    pub fn resolve_name<'a>(
        &self,
        name: Option<&'a str>,
        config: &'a RecorderConfig,
    ) -> RecorderResult<&'a str> {
        if let Some(name) = name {
            return Ok(name);
        }
        match config.get("name") {
            Some(Value::String(name)) => Ok(name),
            Some(other) => Err(RecorderError::InvalidConfig(format!(
                "'name' must be a string, got {}",
                other
            ))),
            None => Err(RecorderError::MissingName),
        }
    }

    /// Build a recorder
    ///
    /// The backend comes from `name` when given, otherwise from the `name`
    /// key of `config`. Fails if the backend is unknown or required
    /// backend keys are missing.
    pub async fn create(
        &self,
        name: Option<&str>,
        config: &RecorderConfig,
    ) -> RecorderResult<Arc<dyn Recorder>> {
        let name = self.resolve_name(name, config)?;

        let factory =
            self.factories
                .get(name)
                .ok_or_else(|| RecorderError::UnknownBackend {
                    name: name.to_string(),
                    available: self.backends().join(","),
                })?;

        let missing: Vec<String> = factory
            .required_keys()
            .iter()
            .filter(|key| !config.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RecorderError::MissingKeys {
                backend: name.to_string(),
                keys: missing,
            });
        }

        debug!(backend = name, "Creating recorder");
        factory.create(config).await
    }
}

impl std::fmt::Debug for RecorderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderRegistry")
            .field("backends", &self.backends())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryRecorder;
    use serde_json::json;

    fn config(value: Value) -> RecorderConfig {
        match value {
            Value::Object(map) => map,
            _ => panic!("config must be an object"),
        }
    }

    #[tokio::test]
    async fn test_create_from_config_name() {
        let registry = RecorderRegistry::with_builtins();
        let recorder = registry
            .create(None, &config(json!({"name": "memory"})))
            .await
            .unwrap();
        assert_eq!(recorder.backend(), "memory");
    }

    #[tokio::test]
    async fn test_explicit_name_wins() {
        let registry = RecorderRegistry::with_builtins();
        let recorder = registry
            .create(Some("memory"), &config(json!({"name": "influxdb"})))
            .await
            .unwrap();
        assert_eq!(recorder.backend(), "memory");
    }

    #[tokio::test]
    async fn test_missing_name() {
        let registry = RecorderRegistry::with_builtins();
        let err = registry.create(None, &RecorderConfig::new()).await.err().unwrap();
        assert!(matches!(err, RecorderError::MissingName));
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_unknown_backend_lists_available() {
        let registry = RecorderRegistry::with_builtins();
        let err = registry
            .create(Some("sqlite"), &RecorderConfig::new())
            .await
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "no recorder registered with sqlite. Available recorders are influxdb,memory"
        );
    }

    #[tokio::test]
    async fn test_missing_keys_are_named() {
        let registry = RecorderRegistry::with_builtins();
        let err = registry
            .create(
                None,
                &config(json!({"name": "influxdb", "host": "localhost", "port": 8086})),
            )
            .await
            .err()
            .unwrap();
        match err {
            RecorderError::MissingKeys { backend, keys } => {
                assert_eq!(backend, "influxdb");
                assert_eq!(keys, vec!["database", "username", "password"]);
            }
            other => panic!("Expected MissingKeys, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_backend_rejected() {
        let mut registry = RecorderRegistry::with_builtins();
        let err = registry
            .register_backend("memory", Arc::new(MemoryRecorderFactory::new()))
            .unwrap_err();
        assert!(matches!(err, RecorderError::DuplicateBackend(ref n) if n == "memory"));

        registry
            .register_backend("unittest", Arc::new(MemoryRecorderFactory::new()))
            .unwrap();
        assert_eq!(registry.backends(), vec!["influxdb", "memory", "unittest"]);
    }

    #[tokio::test]
    async fn test_shared_sink_factory() {
        let sink = Arc::new(MemoryRecorder::new());
        let mut registry = RecorderRegistry::new();
        registry
            .register_backend("unittest", Arc::new(MemoryRecorderFactory::with_sink(sink.clone())))
            .unwrap();

        let recorder = registry
            .create(Some("unittest"), &RecorderConfig::new())
            .await
            .unwrap();
        recorder.close().await.unwrap();
        assert_eq!(sink.close_count(), 1);
    }
}
