//! Sliding-window construction over normalized records.
//!
//! Window starts advance by the configured step from the earliest record
//! timestamp; each window covers the half-open interval
//! `[start, start + length)`. Slots without records produce no window and
//! consume no index.

use crate::config::WindowSpec;
use crate::core::stats::FieldStats;
use crate::record::NormalizedRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fixed-length time bucket annotated with per-field aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    /// Position in the emitted sequence
    pub index: u64,
    /// Inclusive start of the bucket
    pub start: f64,
    /// Exclusive end; always `start + length`
    pub end: f64,
    /// Field name to aggregates, sorted by name
    pub stats: BTreeMap<String, FieldStats>,
}

impl Window {
    /// Whether a timestamp falls inside this window.
    pub fn contains(&self, timestamp: f64) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

/// Build the ordered window sequence for a batch of records.
///
/// Records are stably sorted by timestamp first. The sweep keeps two
/// cursors into the sorted slice, both of which only ever move forward, so
/// the cost is linear in the record count plus the number of iterated
/// slots even when windows overlap.
pub fn build_windows(mut records: Vec<NormalizedRecord>, spec: &WindowSpec) -> Vec<Window> {
    if records.is_empty() {
        return Vec::new();
    }
    records.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let tmin = records[0].timestamp;
    let tmax = records[records.len() - 1].timestamp;

    let mut windows = Vec::new();
    let mut index = 0u64;
    let mut lo = 0usize;
    let mut hi = 0usize;
    let mut start = tmin;
    while start <= tmax {
        let end = start + spec.length();
        while lo < records.len() && records[lo].timestamp < start {
            lo += 1;
        }
        if hi < lo {
            hi = lo;
        }
        while hi < records.len() && records[hi].timestamp < end {
            hi += 1;
        }
        if lo < hi {
            windows.push(aggregate(index, start, end, &records[lo..hi]));
            index += 1;
        }
        // A step below the float resolution at this magnitude cannot
        // advance the sweep; stop rather than spin.
        let next = start + spec.step();
        if next == start {
            break;
        }
        start = next;
    }
    windows
}

/// Aggregate one non-empty selection into a window.
///
/// The field set is the union over the selected records; a record missing a
/// field simply contributes nothing to that field.
fn aggregate(index: u64, start: f64, end: f64, records: &[NormalizedRecord]) -> Window {
    let mut samples: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in records {
        for (name, value) in &record.fields {
            samples.entry(name).or_default().push(*value);
        }
    }

    let stats = samples
        .into_iter()
        .map(|(name, values)| (name.to_string(), FieldStats::from_samples(&values)))
        .collect();

    Window {
        index,
        start,
        end,
        stats,
    }
}
