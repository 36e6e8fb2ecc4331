//! obd-conv - Conversion of OBD readings into time-series packets
//!
//! Turns typed device readings into [`Packet`]s: measurement name, string
//! tags, numeric fields and a nanosecond timestamp.
//!
//! # Quick Start
//!
//! ```rust
//! use obd_conv::ConverterRegistry;
//! use obd_core::{Metric, Response, ResponseValue};
//!
//! let registry = ConverterRegistry::with_builtins();
//!
//! let rpm = Metric::from_name("RPM").unwrap();
//! let response = Response::new(rpm, ResponseValue::quantity(3000.0, "rpm"), 1_700_000_000.0);
//!
//! let packet = registry.convert(&response).unwrap();
//! assert_eq!(packet.measurement, "RPM");
//! assert_eq!(packet.fields["value"], 3000.0);
//! ```
//!
//! # Converter table
//!
//! | Kind | Field | Example |
//! |------|-------|---------|
//! | Quantity / Count | `value` | RPM, COOLANT_TEMP, ELM_VOLTAGE |
//! | Percent | `percent` | ACCELERATOR_POS_E, FUEL_LEVEL |
//! | Trouble codes | unsupported | GET_DTC, FREEZE_DTC |
//! | Status | unsupported | STATUS |

pub mod converters;
pub mod error;
pub mod packet;
pub mod registry;

pub use converters::{dtc_packet, float_packet, percent_packet, status_packet};
pub use error::{ConvError, ConvResult};
pub use packet::{BuilderState, Packet, PacketBuilder};
pub use registry::{canonical_key, Converter, ConverterRegistry, MetricKey};
