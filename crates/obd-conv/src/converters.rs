//! Built-in converters
//!
//! Scalar readings become one-field packets: `value` for physical
//! quantities, `percent` for percentages. Multi-valued readings (trouble
//! codes, monitor status) are refused loudly rather than dropped.

use obd_core::{Metric, Response};

use crate::error::{ConvError, ConvResult};
use crate::packet::{Packet, PacketBuilder};
use crate::registry::ConverterRegistry;

/// Percentage metrics
const PERCENT_METRICS: &[&str] = &[
    "ACCELERATOR_POS_E",
    "ACCELERATOR_POS_D",
    "ENGINE_LOAD",
    "ABSOLUTE_LOAD",
    "THROTTLE_POS",
    "RELATIVE_THROTTLE_POS",
    "FUEL_LEVEL",
    "ETHANOL_PERCENT",
    "SHORT_FUEL_TRIM_1",
    "LONG_FUEL_TRIM_1",
    "SHORT_FUEL_TRIM_2",
    "LONG_FUEL_TRIM_2",
];

/// Float-valued metrics
const FLOAT_METRICS: &[&str] = &[
    "COOLANT_TEMP",
    "DTC_BAROMETRIC_PRESSURE",
    "DTC_INTAKE_TEMP",
    "DTC_RUN_TIME",
    "DTC_COOLANT_TEMP",
    "DTC_RPM",
    "DTC_SPEED",
    "ELM_VOLTAGE",
    "RPM",
    "RUN_TIME",
    "SPEED",
    "INTAKE_TEMP",
    "INTAKE_PRESSURE",
    "FUEL_PRESSURE",
    "TIMING_ADVANCE",
    "MAF",
    "DISTANCE_W_MIL",
    "DISTANCE_SINCE_DTC_CLEAR",
    "WARMUPS_SINCE_DTC_CLEAR",
    "BAROMETRIC_PRESSURE",
    "CONTROL_MODULE_VOLTAGE",
    "AMBIANT_AIR_TEMP",
    "RUN_TIME_MIL",
    "TIME_SINCE_DTC_CLEARED",
    "OIL_TEMP",
    "FUEL_RATE",
];

const DTC_METRICS: &[&str] = &["FREEZE_DTC", "GET_DTC", "GET_CURRENT_DTC"];

const STATUS_METRICS: &[&str] = &["STATUS"];

/// Packet with the reading's magnitude in the `value` field
pub fn float_packet(response: &Response) -> ConvResult<Packet> {
    scalar_packet(response, "value")
}

/// Packet with the reading's magnitude in the `percent` field
pub fn percent_packet(response: &Response) -> ConvResult<Packet> {
    scalar_packet(response, "percent")
}

/// Trouble-code readings are multi-valued
pub fn dtc_packet(response: &Response) -> ConvResult<Packet> {
    Err(ConvError::Unsupported(response.metric.name().to_string()))
}

/// Status readings are multi-valued
pub fn status_packet(response: &Response) -> ConvResult<Packet> {
    Err(ConvError::Unsupported(response.metric.name().to_string()))
}

fn scalar_packet(response: &Response, field: &str) -> ConvResult<Packet> {
    let magnitude = response
        .value
        .magnitude()
        .ok_or_else(|| ConvError::InvalidValue {
            metric: response.metric.name().to_string(),
            reason: "reading has no numeric magnitude".to_string(),
        })?;

    let mut builder = PacketBuilder::started(response.metric.name());
    builder
        .add_timestamp(Some(response.time))?
        .add_field(field, magnitude)?;
    builder.serialize()
}

/// Register the default converter table
pub(crate) fn register_builtins(registry: &ConverterRegistry) {
    let groups: [(&[&str], fn(&Response) -> ConvResult<Packet>); 4] = [
        (PERCENT_METRICS, percent_packet),
        (FLOAT_METRICS, float_packet),
        (DTC_METRICS, dtc_packet),
        (STATUS_METRICS, status_packet),
    ];

    for (names, converter) in groups {
        for name in names {
            let metric = Metric::from_name(name);
            debug_assert!(metric.is_some(), "{} missing from catalog", name);
            if let Some(metric) = metric {
                if let Err(e) = registry.register(&metric, converter) {
                    tracing::warn!(metric = %metric, error = %e, "Skipping built-in converter");
                }
            }
        }
    }
}
