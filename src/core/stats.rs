//! Per-field aggregate statistics.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Aggregates for one field over one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation (n−1 divisor); NaN with fewer than two
    /// samples
    pub std: f64,
}

impl FieldStats {
    /// Compute aggregates over the values that carried this field.
    ///
    /// Callers pass a non-empty slice: a window only lists fields that
    /// appeared in at least one of its records.
    pub fn from_samples(values: &[f64]) -> Self {
        Self {
            min: Statistics::min(values),
            max: Statistics::max(values),
            mean: Statistics::mean(values),
            std: Statistics::std_dev(values),
        }
    }
}
