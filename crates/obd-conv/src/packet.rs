//! Time-series packets and the builder that assembles them
//!
//! A [`Packet`] is one point: a measurement name, string tags, numeric
//! fields and a nanosecond timestamp. [`PacketBuilder`] enforces the
//! construction order before a packet can be produced:
//!
//! ```text
//! Empty ──start()──▶ Started ──add_timestamp()──▶ Timestamped ──add_fields()──▶ Fielded
//!   ▲                                                                               │
//!   └───────────────────────────── start() resets ──────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use obd_conv::PacketBuilder;
//!
//! let mut builder = PacketBuilder::new();
//! builder.start("RPM");
//! builder.add_timestamp(Some(1_700_000_000.0)).unwrap();
//! builder.add_field("value", 3000.0).unwrap();
//!
//! let packet = builder.serialize().unwrap();
//! assert_eq!(packet.time, 1_700_000_000_000_000_000);
//! ```

use std::collections::BTreeMap;

use obd_core::unix_seconds;
use serde::{Deserialize, Serialize};

use crate::error::{ConvError, ConvResult};

/// A serialized time-series record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Measurement name (the metric identifier)
    pub measurement: String,
    /// Timestamp in nanoseconds since the Unix epoch
    pub time: i64,
    /// Tag name → value
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Field name → value
    pub fields: BTreeMap<String, f64>,
}

impl Packet {
    /// Canonical JSON transport form
    pub fn to_json(&self) -> ConvResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the JSON transport form
    pub fn from_json(json: &str) -> ConvResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Construction progress of the in-flight packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing started
    Empty,
    /// Measurement set
    Started,
    /// Measurement and timestamp set
    Timestamped,
    /// At least one field present
    Fielded,
}

#[derive(Debug, Clone)]
struct Draft {
    measurement: String,
    time: Option<i64>,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, f64>,
}

/// Builder for a single [`Packet`]
#[derive(Debug, Clone, Default)]
pub struct PacketBuilder {
    draft: Option<Draft>,
}

impl PacketBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with a packet already started
    pub fn started(measurement: impl Into<String>) -> Self {
        let mut builder = Self::new();
        builder.start(measurement);
        builder
    }

    /// Discard any in-progress packet and start a new one
    pub fn start(&mut self, measurement: impl Into<String>) -> &mut Self {
        self.draft = Some(Draft {
            measurement: measurement.into(),
            time: None,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        });
        self
    }

    /// Add a single tag
    pub fn add_tag(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> ConvResult<&mut Self> {
        self.draft_mut()?.tags.insert(name.into(), value.into());
        Ok(self)
    }

    /// Add tags from parallel name/value lists
    ///
    /// Later values overwrite earlier ones with the same name.
    pub fn add_tags<N, V>(&mut self, names: &[N], values: &[V]) -> ConvResult<&mut Self>
    where
        N: AsRef<str>,
        V: ToString,
    {
        check_lengths("tags", names.len(), values.len())?;
        let draft = self.draft_mut()?;
        for (name, value) in names.iter().zip(values) {
            draft.tags.insert(name.as_ref().to_string(), value.to_string());
        }
        Ok(self)
    }

    /// Add a single field
    pub fn add_field(&mut self, name: impl Into<String>, value: f64) -> ConvResult<&mut Self> {
        self.draft_mut()?.fields.insert(name.into(), value);
        Ok(self)
    }

    /// Add fields from parallel name/value lists
    ///
    /// Later values overwrite earlier ones with the same name.
    pub fn add_fields<N>(&mut self, names: &[N], values: &[f64]) -> ConvResult<&mut Self>
    where
        N: AsRef<str>,
    {
        check_lengths("fields", names.len(), values.len())?;
        let draft = self.draft_mut()?;
        for (name, value) in names.iter().zip(values) {
            draft.fields.insert(name.as_ref().to_string(), *value);
        }
        Ok(self)
    }

    /// Timestamp the packet
    ///
    /// `None` uses the current wall-clock time. Seconds are converted to
    /// nanoseconds by multiplying by 1e9 and truncating. A second call
    /// overwrites the first.
    pub fn add_timestamp(&mut self, seconds: Option<f64>) -> ConvResult<&mut Self> {
        let seconds = seconds.unwrap_or_else(unix_seconds);
        let nanos = seconds * 1e9;
        if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
            return Err(ConvError::InvalidTimestamp(seconds));
        }
        self.draft_mut()?.time = Some(nanos as i64);
        Ok(self)
    }

    /// Produce the packet
    ///
    /// Fails with the first missing prerequisite: not started, not
    /// timestamped, then no fields.
    pub fn serialize(&self) -> ConvResult<Packet> {
        let draft = self.draft.as_ref().ok_or(ConvError::NotStarted)?;
        let time = draft.time.ok_or(ConvError::NotTimestamped)?;
        if draft.fields.is_empty() {
            return Err(ConvError::NoFields);
        }

        Ok(Packet {
            measurement: draft.measurement.clone(),
            time,
            tags: draft.tags.clone(),
            fields: draft.fields.clone(),
        })
    }

    /// Serialize straight to the JSON transport form
    pub fn to_json(&self) -> ConvResult<String> {
        self.serialize()?.to_json()
    }

    /// Current timestamp in nanoseconds, if set
    pub fn timestamp(&self) -> Option<i64> {
        self.draft.as_ref().and_then(|d| d.time)
    }

    /// Current measurement name, if started
    pub fn measurement(&self) -> Option<&str> {
        self.draft.as_ref().map(|d| d.measurement.as_str())
    }

    /// Current construction state
    pub fn state(&self) -> BuilderState {
        match &self.draft {
            None => BuilderState::Empty,
            Some(d) if d.time.is_none() => BuilderState::Started,
            Some(d) if d.fields.is_empty() => BuilderState::Timestamped,
            Some(_) => BuilderState::Fielded,
        }
    }

    fn draft_mut(&mut self) -> ConvResult<&mut Draft> {
        self.draft.as_mut().ok_or(ConvError::NotStarted)
    }
}

fn check_lengths(kind: &'static str, names: usize, values: usize) -> ConvResult<()> {
    if names != values {
        return Err(ConvError::LengthMismatch {
            kind,
            names,
            values,
        });
    }
    Ok(())
}
