//! Device readings

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::catalog::Metric;

/// A decoded value returned by the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseValue {
    /// Physical quantity with unit
    Quantity { magnitude: f64, unit: String },
    /// Percentage
    Percent { magnitude: f64 },
    /// Dimensionless count
    Count { magnitude: f64 },
    /// Free text
    Text { text: String },
    /// Trouble codes as (code, description) pairs
    TroubleCodes { codes: Vec<(String, String)> },
    /// Monitor status block
    Status(MonitorStatus),
}

impl ResponseValue {
    pub fn quantity(magnitude: f64, unit: impl Into<String>) -> Self {
        Self::Quantity {
            magnitude,
            unit: unit.into(),
        }
    }

    pub fn percent(magnitude: f64) -> Self {
        Self::Percent { magnitude }
    }

    /// Scalar magnitude for single-valued numeric readings
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            ResponseValue::Quantity { magnitude, .. }
            | ResponseValue::Percent { magnitude }
            | ResponseValue::Count { magnitude } => Some(*magnitude),
            _ => None,
        }
    }

    /// Unit attached to the reading, if any
    pub fn unit(&self) -> Option<&str> {
        match self {
            ResponseValue::Quantity { unit, .. } if !unit.is_empty() => Some(unit),
            ResponseValue::Percent { .. } => Some("percent"),
            _ => None,
        }
    }
}

/// Readiness monitor status (mode 01 PID 01)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStatus {
    /// Malfunction indicator lamp lit
    pub mil: bool,
    /// Number of stored trouble codes
    pub dtc_count: u8,
    /// Ignition type ("spark" or "compression")
    pub ignition_type: String,
}

/// One reading of a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Metric that was queried
    pub metric: Metric,
    /// Decoded value
    pub value: ResponseValue,
    /// Time of the reading (seconds since the Unix epoch)
    pub time: f64,
}

impl Response {
    pub fn new(metric: Metric, value: ResponseValue, time: f64) -> Self {
        Self {
            metric,
            value,
            time,
        }
    }

    /// Reading stamped with the current wall-clock time
    pub fn now(metric: Metric, value: ResponseValue) -> Self {
        Self::new(metric, value, unix_seconds())
    }
}

/// Current wall-clock time as fractional seconds since the epoch
pub fn unix_seconds() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
}
