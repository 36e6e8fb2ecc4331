//! InfluxDB line protocol encoding
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] timestamp
//! ```

use std::fmt::Write;

use obd_conv::Packet;

use crate::error::{RecorderError, RecorderResult};

/// Encode one packet as a line-protocol point (no trailing newline)
pub fn encode(packet: &Packet) -> RecorderResult<String> {
    if packet.measurement.is_empty() {
        return Err(RecorderError::InvalidPacket("empty measurement".to_string()));
    }
    if packet.fields.is_empty() {
        return Err(RecorderError::InvalidPacket(format!(
            "{} has no fields",
            packet.measurement
        )));
    }

    let mut line = escape(&packet.measurement, &[',', ' ']);

    // Empty tag values are not representable
    for (key, value) in packet.tags.iter().filter(|(_, v)| !v.is_empty()) {
        let _ = write!(
            line,
            ",{}={}",
            escape(key, &[',', '=', ' ']),
            escape(value, &[',', '=', ' '])
        );
    }

    let mut separator = ' ';
    for (key, value) in &packet.fields {
        if !value.is_finite() {
            return Err(RecorderError::InvalidPacket(format!(
                "{}.{} is not finite ({})",
                packet.measurement, key, value
            )));
        }
        let _ = write!(line, "{}{}={}", separator, escape(key, &[',', '=', ' ']), value);
        separator = ',';
    }

    let _ = write!(line, " {}", packet.time);
    Ok(line)
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
