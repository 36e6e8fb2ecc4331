//! Metric catalog
//!
//! The closed set of OBD-II commands the scanner knows how to request.
//! Names follow the conventional OBD command naming (`RPM`, `SPEED`,
//! `COOLANT_TEMP`, ...). Anything not listed here is rejected at the
//! configuration boundary.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Shape of the value a metric produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Physical quantity with a unit (rpm, kph, degC, ...)
    Quantity,
    /// Percentage (0-100)
    Percent,
    /// Dimensionless counter
    Count,
    /// Free text (VIN, adapter version)
    Text,
    /// List of diagnostic trouble codes
    TroubleCodes,
    /// Monitor/readiness status block
    Status,
}

impl ValueKind {
    /// Multi-valued readings cannot be flattened into a single record
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, ValueKind::TroubleCodes | ValueKind::Status)
    }

    /// Whether the reading has a single numeric magnitude
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ValueKind::Quantity | ValueKind::Percent | ValueKind::Count
        )
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValueKind::Quantity => "quantity",
            ValueKind::Percent => "percent",
            ValueKind::Count => "count",
            ValueKind::Text => "text",
            ValueKind::TroubleCodes => "trouble_codes",
            ValueKind::Status => "status",
        };
        f.write_str(s)
    }
}

/// Static description of one catalog entry
#[derive(Debug, PartialEq, Eq)]
pub struct MetricInfo {
    /// Canonical command name
    pub name: &'static str,
    /// Request sent to the adapter (mode + PID hex, or AT command)
    pub request: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Unit of the decoded value (empty when dimensionless)
    pub unit: &'static str,
    /// Value shape
    pub kind: ValueKind,
}

macro_rules! metric {
    ($name:literal, $request:literal, $desc:literal, $unit:literal, $kind:ident) => {
        MetricInfo {
            name: $name,
            request: $request,
            description: $desc,
            unit: $unit,
            kind: ValueKind::$kind,
        }
    };
}

static CATALOG: &[MetricInfo] = &[
    // Mode 01 - current data
    metric!("STATUS", "0101", "Status since DTCs cleared", "", Status),
    metric!("FREEZE_DTC", "0102", "DTC that triggered the freeze frame", "", TroubleCodes),
    metric!("FUEL_STATUS", "0103", "Fuel System Status", "", Text),
    metric!("ENGINE_LOAD", "0104", "Calculated Engine Load", "percent", Percent),
    metric!("COOLANT_TEMP", "0105", "Engine Coolant Temperature", "degC", Quantity),
    metric!("SHORT_FUEL_TRIM_1", "0106", "Short Term Fuel Trim - Bank 1", "percent", Percent),
    metric!("LONG_FUEL_TRIM_1", "0107", "Long Term Fuel Trim - Bank 1", "percent", Percent),
    metric!("SHORT_FUEL_TRIM_2", "0108", "Short Term Fuel Trim - Bank 2", "percent", Percent),
    metric!("LONG_FUEL_TRIM_2", "0109", "Long Term Fuel Trim - Bank 2", "percent", Percent),
    metric!("FUEL_PRESSURE", "010A", "Fuel Pressure", "kPa", Quantity),
    metric!("INTAKE_PRESSURE", "010B", "Intake Manifold Pressure", "kPa", Quantity),
    metric!("RPM", "010C", "Engine RPM", "rpm", Quantity),
    metric!("SPEED", "010D", "Vehicle Speed", "kph", Quantity),
    metric!("TIMING_ADVANCE", "010E", "Timing Advance", "degree", Quantity),
    metric!("INTAKE_TEMP", "010F", "Intake Air Temp", "degC", Quantity),
    metric!("MAF", "0110", "Air Flow Rate (MAF)", "g/s", Quantity),
    metric!("THROTTLE_POS", "0111", "Throttle Position", "percent", Percent),
    metric!("RUN_TIME", "011F", "Engine Run Time", "second", Quantity),
    metric!("DISTANCE_W_MIL", "0121", "Distance Traveled with MIL on", "km", Quantity),
    metric!("FUEL_LEVEL", "012F", "Fuel Level Input", "percent", Percent),
    metric!("WARMUPS_SINCE_DTC_CLEAR", "0130", "Number of warm-ups since codes cleared", "", Count),
    metric!("DISTANCE_SINCE_DTC_CLEAR", "0131", "Distance traveled since codes cleared", "km", Quantity),
    metric!("BAROMETRIC_PRESSURE", "0133", "Barometric Pressure", "kPa", Quantity),
    metric!("CONTROL_MODULE_VOLTAGE", "0142", "Control module voltage", "volt", Quantity),
    metric!("ABSOLUTE_LOAD", "0143", "Absolute load value", "percent", Percent),
    metric!("RELATIVE_THROTTLE_POS", "0145", "Relative throttle position", "percent", Percent),
    metric!("AMBIANT_AIR_TEMP", "0146", "Ambient air temperature", "degC", Quantity),
    metric!("ACCELERATOR_POS_D", "0149", "Accelerator pedal position D", "percent", Percent),
    metric!("ACCELERATOR_POS_E", "014A", "Accelerator pedal position E", "percent", Percent),
    metric!("RUN_TIME_MIL", "014D", "Time run with MIL on", "minute", Quantity),
    metric!("TIME_SINCE_DTC_CLEARED", "014E", "Time since trouble codes cleared", "minute", Quantity),
    metric!("ETHANOL_PERCENT", "0152", "Ethanol Fuel Percent", "percent", Percent),
    metric!("OIL_TEMP", "015C", "Engine oil temperature", "degC", Quantity),
    metric!("FUEL_RATE", "015E", "Engine fuel rate", "liters_per_hour", Quantity),
    // Mode 02 - freeze frame
    metric!("DTC_COOLANT_TEMP", "0205", "Engine Coolant Temperature", "degC", Quantity),
    metric!("DTC_RPM", "020C", "Engine RPM", "rpm", Quantity),
    metric!("DTC_SPEED", "020D", "Vehicle Speed", "kph", Quantity),
    metric!("DTC_INTAKE_TEMP", "020F", "Intake Air Temp", "degC", Quantity),
    metric!("DTC_RUN_TIME", "021F", "Engine Run Time", "second", Quantity),
    metric!("DTC_BAROMETRIC_PRESSURE", "0233", "Barometric Pressure", "kPa", Quantity),
    // Mode 03 / 07 - trouble codes
    metric!("GET_DTC", "03", "Get DTCs", "", TroubleCodes),
    metric!("GET_CURRENT_DTC", "07", "Get DTCs from the current/last driving cycle", "", TroubleCodes),
    // Mode 09 - vehicle information
    metric!("VIN", "0902", "Vehicle Identification Number", "", Text),
    // Adapter commands
    metric!("ELM_VERSION", "ATI", "ELM327 version string", "", Text),
    metric!("ELM_VOLTAGE", "ATRV", "Voltage detected by OBD-II adapter", "volt", Quantity),
];

/// A metric from the catalog
///
/// Cheap to copy; equality and hashing go by canonical name.
#[derive(Clone, Copy)]
pub struct Metric(&'static MetricInfo);

impl Metric {
    /// Look up a metric by canonical name
    pub fn from_name(name: &str) -> Option<Self> {
        CATALOG.iter().find(|m| m.name == name).map(Metric)
    }

    /// Canonical name (e.g. "RPM")
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// Adapter request string
    pub fn request(&self) -> &'static str {
        self.0.request
    }

    pub fn description(&self) -> &'static str {
        self.0.description
    }

    /// Unit of the decoded value, if any
    pub fn unit(&self) -> Option<&'static str> {
        (!self.0.unit.is_empty()).then_some(self.0.unit)
    }

    pub fn kind(&self) -> ValueKind {
        self.0.kind
    }

    /// Full catalog entry
    pub fn info(&self) -> &'static MetricInfo {
        self.0
    }
}

impl PartialEq for Metric {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for Metric {}

impl std::hash::Hash for Metric {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl std::fmt::Debug for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Metric({})", self.0.name)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.name)
    }
}

impl std::str::FromStr for Metric {
    type Err = crate::error::UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::from_name(s).ok_or_else(|| crate::error::UnknownMetric(s.to_string()))
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.name)
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Check whether a name belongs to the catalog
pub fn has_name(name: &str) -> bool {
    Metric::from_name(name).is_some()
}

/// Iterate over every catalog entry
pub fn all() -> impl Iterator<Item = Metric> {
    CATALOG.iter().map(Metric)
}
