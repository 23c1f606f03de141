//! Typed metadata records decoded from a UKSoft image header.
//!
//! Elmitec instruments store heterogeneous key-value records: lens voltages
//! and currents, pressures, exposure settings, stage positions, free-text
//! titles. Firmware revisions add tags freely, so the value space is a
//! closed tagged variant with an explicit raw case for fields this crate
//! does not recognize.
use serde::Serialize;
use std::collections::BTreeMap;

/// Decoded metadata map. Keys are unique within one file; a repeated key
/// overwrites the earlier record (last write wins).
pub type Metadata = BTreeMap<String, MetaValue>;

/// One decoded metadata value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum MetaValue {
    /// Small integer fields (mirror states, averaging counts, flags).
    Int(i64),
    /// Plain float without a physical unit.
    Float(f32),
    /// Float with its instrument unit ("V", "mA", "°C", ...).
    Quantity { value: f32, unit: String },
    /// Free-text fields (image title, recipe names).
    Text(String),
    /// Unrecognized field tag: the consumed bytes, kept verbatim so callers
    /// can still inspect them.
    Raw(Vec<u8>),
}

impl MetaValue {
    /// Numeric view of the value, when it has one.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Int(v) => Some(*v as f32),
            Self::Float(v) => Some(*v),
            Self::Quantity { value, .. } => Some(*value),
            Self::Text(_) | Self::Raw(_) => None,
        }
    }

    /// Integer view of the value, when it has one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of the value, when it has one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Unit string for [`MetaValue::Quantity`], empty otherwise.
    pub fn unit(&self) -> &str {
        match self {
            Self::Quantity { unit, .. } => unit,
            _ => "",
        }
    }
}
