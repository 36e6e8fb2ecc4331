//! Converter registry - dispatch from metric to conversion function
//!
//! Every key is canonicalized through [`MetricKey`] before it touches the
//! table, so the registry only ever stores catalog names.

use std::collections::HashMap;
use std::sync::Arc;

use obd_core::{Metric, Response};
use parking_lot::RwLock;
use tracing::debug;

use crate::converters;
use crate::error::{ConvError, ConvResult};
use crate::packet::Packet;

/// Conversion function for one metric
pub type Converter = Arc<dyn Fn(&Response) -> ConvResult<Packet> + Send + Sync>;

/// Anything that identifies a catalog metric
///
/// Strings are validated against the catalog; unknown names fail instead
/// of creating a new registry slot.
pub trait MetricKey {
    fn metric(&self) -> ConvResult<Metric>;
}

impl MetricKey for Metric {
    fn metric(&self) -> ConvResult<Metric> {
        Ok(*self)
    }
}

impl MetricKey for Response {
    fn metric(&self) -> ConvResult<Metric> {
        Ok(self.metric)
    }
}

impl MetricKey for str {
    fn metric(&self) -> ConvResult<Metric> {
        Ok(self.parse::<Metric>()?)
    }
}

impl MetricKey for String {
    fn metric(&self) -> ConvResult<Metric> {
        self.as_str().metric()
    }
}

impl<K: MetricKey + ?Sized> MetricKey for &K {
    fn metric(&self) -> ConvResult<Metric> {
        (**self).metric()
    }
}

/// Canonical registry key for a metric reference
pub fn canonical_key<K: MetricKey + ?Sized>(key: &K) -> ConvResult<&'static str> {
    Ok(key.metric()?.name())
}

/// Thread-safe table of converters, one per metric
#[derive(Default)]
pub struct ConverterRegistry {
    converters: RwLock<HashMap<&'static str, Converter>>,
}

impl ConverterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in converter table
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        converters::register_builtins(&registry);
        registry
    }

    /// Register a converter
    ///
    /// Fails if the metric already has one; the first registration stays.
    pub fn register<K, F>(&self, key: &K, converter: F) -> ConvResult<()>
    where
        K: MetricKey + ?Sized,
        F: Fn(&Response) -> ConvResult<Packet> + Send + Sync + 'static,
    {
        let name = canonical_key(key)?;
        let mut converters = self.converters.write();
        if converters.contains_key(name) {
            return Err(ConvError::DuplicateConverter(name.to_string()));
        }
        converters.insert(name, Arc::new(converter));
        debug!(metric = name, "Registered converter");
        Ok(())
    }

    /// Get the converter for a metric
    pub fn get<K: MetricKey + ?Sized>(&self, key: &K) -> ConvResult<Converter> {
        let name = canonical_key(key)?;
        self.converters
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ConvError::NoConverter(name.to_string()))
    }

    /// Check whether a metric has a converter
    pub fn contains<K: MetricKey + ?Sized>(&self, key: &K) -> bool {
        canonical_key(key)
            .map(|name| self.converters.read().contains_key(name))
            .unwrap_or(false)
    }

    /// Convert a reading with the converter registered for its metric
    pub fn convert(&self, response: &Response) -> ConvResult<Packet> {
        let converter = self.get(response)?;
        converter(response)
    }

    /// Registered metric names, sorted
    pub fn metrics(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.converters.read().keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered converters
    pub fn len(&self) -> usize {
        self.converters.read().len()
    }

    /// Whether no converter is registered
    pub fn is_empty(&self) -> bool {
        self.converters.read().is_empty()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("metrics", &self.metrics())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::{float_packet, percent_packet};
    use obd_core::ResponseValue;

    fn rpm() -> Metric {
        Metric::from_name("RPM").unwrap()
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let registry = ConverterRegistry::new();
        registry.register(&rpm(), float_packet).unwrap();

        let err = registry.register("RPM", percent_packet).unwrap_err();
        assert!(matches!(err, ConvError::DuplicateConverter(ref name) if name == "RPM"));

        // The float converter is still the one in use
        let response = Response::new(rpm(), ResponseValue::quantity(900.0, "rpm"), 10.0);
        let packet = registry.convert(&response).unwrap();
        assert_eq!(packet.fields["value"], 900.0);
        assert!(!packet.fields.contains_key("percent"));
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let registry = ConverterRegistry::new();
        let err = registry.register("NOT_A_COMMAND", float_packet).unwrap_err();
        assert!(matches!(err, ConvError::UnknownMetric(_)));
        assert!(registry.is_empty());

        assert!(matches!(
            registry.get("NOT_A_COMMAND"),
            Err(ConvError::UnknownMetric(_))
        ));
        assert!(!registry.contains("NOT_A_COMMAND"));
    }

    #[test]
    fn test_get_missing_converter() {
        let registry = ConverterRegistry::new();
        assert!(matches!(
            registry.get("SPEED"),
            Err(ConvError::NoConverter(ref name)) if name == "SPEED"
        ));
    }

    #[test]
    fn test_key_forms_agree() {
        let registry = ConverterRegistry::new();
        registry.register(&String::from("RPM"), float_packet).unwrap();

        let response = Response::new(rpm(), ResponseValue::quantity(1.0, "rpm"), 1.0);
        assert!(registry.contains(&rpm()));
        assert!(registry.contains("RPM"));
        assert!(registry.contains(&response));
        assert_eq!(registry.metrics(), vec!["RPM"]);
        assert_eq!(canonical_key(&response).unwrap(), "RPM");
    }

    #[test]
    fn test_closure_converter() {
        let registry = ConverterRegistry::new();
        registry
            .register("SPEED", |response: &Response| {
                let mut packet = float_packet(response)?;
                packet.tags.insert("source".into(), "test".into());
                Ok(packet)
            })
            .unwrap();

        let speed = Metric::from_name("SPEED").unwrap();
        let response = Response::new(speed, ResponseValue::quantity(88.0, "kph"), 5.0);
        let packet = registry.convert(&response).unwrap();
        assert_eq!(packet.tags["source"], "test");
        assert_eq!(packet.time, 5_000_000_000);
    }
}
