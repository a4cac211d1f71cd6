//! Record types for the windowing pipeline.
//!
//! A raw record arrives with a source tag and its measurements encoded as a
//! JSON payload string; normalization turns it into a flat numeric field map
//! keyed by measurement name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A record as read from an input source, prior to any validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// Source tag of the originating sensor (the ECU name in automotive
    /// captures)
    #[serde(default)]
    pub name: Option<String>,
    /// Capture timestamp in epoch seconds; any JSON value is accepted here
    /// and validated during normalization
    #[serde(default)]
    pub timestamp: serde_json::Value,
    /// Flat JSON object of measurement name to value, encoded as a string
    #[serde(default)]
    pub data: String,
    /// Protocol fields (frame id, raw bytes) carried through but unused
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawRecord {
    /// The timestamp as a float, if the source supplied a number.
    pub fn timestamp_secs(&self) -> Option<f64> {
        self.timestamp.as_f64()
    }
}

/// A single payload entry, tagged by its JSON shape.
///
/// Whether an entry is numeric is a property of the tag: booleans and
/// digit-only strings never count as numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Number(f64),
    Bool(bool),
    Text(String),
    /// Nested arrays or objects; tolerated by the parser, never numeric
    Other(serde_json::Value),
}

impl PayloadValue {
    /// The numeric value carried by this entry, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PayloadValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// A validated record: a finite timestamp plus the numeric subset of its
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Epoch-second timestamp, already range-checked
    pub timestamp: f64,
    /// Field name to measurement value; sorted iteration order keeps
    /// downstream column layouts deterministic
    pub fields: BTreeMap<String, f64>,
}

impl NormalizedRecord {
    /// Convenience constructor used throughout the test suites.
    pub fn new(timestamp: f64, fields: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            timestamp,
            fields: fields.into_iter().collect(),
        }
    }
}
