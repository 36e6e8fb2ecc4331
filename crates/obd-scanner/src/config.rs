//! Scanner configuration
//!
//! ```json
//! {
//!   "portstr": "/dev/ttyUSB0",
//!   "baudrate": 38400,
//!   "frequency": 10.0,
//!   "commands": ["RPM", "SPEED", "COOLANT_TEMP"],
//!   "recorder": { "name": "influxdb", "host": "localhost", ... }
//! }
//! ```
//!
//! The same keys may be written as TOML, with the recorder as a `[recorder]`
//! table.

use std::path::Path;

use obd_conv::ConverterRegistry;
use obd_core::{DevicePort, Metric};
use obd_storage::RecorderConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};

/// Complete scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Adapter address (serial path, or `mock:` for the simulated device)
    pub portstr: String,

    /// Serial baud rate
    pub baudrate: u32,

    /// Polling frequency in Hz; 10 Hz when absent
    #[serde(default)]
    pub frequency: Option<f64>,

    /// Metric names polled in round-robin order
    #[serde(default)]
    pub commands: Vec<String>,

    /// Recorder section; `name` selects the backend
    #[serde(default)]
    pub recorder: RecorderConfig,
}

impl ScannerConfig {
    /// Load configuration from a file
    ///
    /// `.toml` files are parsed as TOML, anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> ScanResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ScanError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    pub fn from_json(content: &str) -> ScanResult<Self> {
        serde_json::from_str(content).map_err(|e| ScanError::Config(e.to_string()))
    }

    pub fn from_toml(content: &str) -> ScanResult<Self> {
        toml::from_str(content).map_err(|e| ScanError::Config(e.to_string()))
    }

    /// Device address
    pub fn port(&self) -> DevicePort {
        DevicePort::new(self.portstr.clone(), self.baudrate)
    }

    /// Resolve `commands` against the catalog and the converter table
    pub fn metrics(&self, converters: &ConverterRegistry) -> ScanResult<Vec<Metric>> {
        let metrics = self
            .commands
            .iter()
            .map(|name| {
                Metric::from_name(name)
                    .ok_or_else(|| ScanError::Config(format!("unknown OBD command: {}", name)))
            })
            .collect::<ScanResult<Vec<_>>>()?;
        check_metrics(&metrics, converters)?;
        Ok(metrics)
    }
}

/// Check a polling list before any connection is made
///
/// The list must be non-empty. Every metric needs a converter, and
/// multi-valued metrics cannot be flattened into a single packet.
pub fn check_metrics(metrics: &[Metric], converters: &ConverterRegistry) -> ScanResult<()> {
    if metrics.is_empty() {
        return Err(ScanError::Config("no commands provided".to_string()));
    }
    for metric in metrics {
        if metric.kind().is_multi_valued() {
            return Err(ScanError::Config(format!(
                "{} is multi-valued; multi-measurement commands not supported yet",
                metric
            )));
        }
        if !converters.contains(metric) {
            return Err(ScanError::Config(format!(
                "no converter registered for command {}",
                metric
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const JSON: &str = r#"{
        "portstr": "mock:",
        "baudrate": 38400,
        "frequency": 20.0,
        "commands": ["RPM", "SPEED"],
        "recorder": {"name": "memory"}
    }"#;

    #[test]
    fn test_from_json() {
        let config = ScannerConfig::from_json(JSON).unwrap();
        assert_eq!(config.portstr, "mock:");
        assert_eq!(config.baudrate, 38400);
        assert_eq!(config.frequency, Some(20.0));
        assert_eq!(config.commands, vec!["RPM", "SPEED"]);
        assert_eq!(config.recorder["name"], "memory");
        assert_eq!(config.port().to_string(), "mock: @ 38400 baud");
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("scanner.json");
        std::fs::File::create(&json_path)
            .unwrap()
            .write_all(JSON.as_bytes())
            .unwrap();
        assert_eq!(ScannerConfig::load(&json_path).unwrap().commands.len(), 2);

        let toml_path = dir.path().join("scanner.toml");
        std::fs::write(
            &toml_path,
            r#"
portstr = "/dev/ttyUSB0"
baudrate = 115200
commands = ["COOLANT_TEMP"]

[recorder]
name = "influxdb"
host = "localhost"
port = 8086
"#,
        )
        .unwrap();
        let config = ScannerConfig::load(&toml_path).unwrap();
        assert_eq!(config.frequency, None);
        assert_eq!(config.commands, vec!["COOLANT_TEMP"]);
        assert_eq!(config.recorder["port"], 8086);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScannerConfig::load("/nonexistent/scanner.json").unwrap_err();
        assert!(matches!(err, ScanError::ConfigIo { .. }));
    }

    #[test]
    fn test_missing_required_key() {
        let err = ScannerConfig::from_json(r#"{"baudrate": 1, "commands": ["RPM"]}"#).unwrap_err();
        assert!(err.to_string().contains("portstr"));
    }

    #[test]
    fn test_metrics_validation() {
        let converters = ConverterRegistry::with_builtins();
        let mut config = ScannerConfig::from_json(JSON).unwrap();

        let metrics = config.metrics(&converters).unwrap();
        assert_eq!(metrics[0].name(), "RPM");
        assert_eq!(metrics[1].name(), "SPEED");

        config.commands = vec![];
        assert_eq!(
            config.metrics(&converters).unwrap_err().to_string(),
            "Configuration error: no commands provided"
        );

        config.commands = vec!["RPM".into(), "WARP_FACTOR".into()];
        assert!(config
            .metrics(&converters)
            .unwrap_err()
            .to_string()
            .contains("WARP_FACTOR"));

        config.commands = vec!["GET_DTC".into()];
        assert!(config
            .metrics(&converters)
            .unwrap_err()
            .to_string()
            .contains("multi-valued"));

        // Text readings have no converter
        config.commands = vec!["VIN".into()];
        assert!(config
            .metrics(&converters)
            .unwrap_err()
            .to_string()
            .contains("no converter"));
    }

    #[test]
    fn test_duplicate_commands_kept_in_order() {
        let converters = ConverterRegistry::with_builtins();
        let mut config = ScannerConfig::from_json(JSON).unwrap();
        config.commands = vec!["RPM".into(), "SPEED".into(), "RPM".into()];
        let names: Vec<_> = config
            .metrics(&converters)
            .unwrap()
            .iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(names, vec!["RPM", "SPEED", "RPM"]);
    }
}
