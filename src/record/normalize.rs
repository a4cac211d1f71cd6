//! Record normalization: timestamp validation, source filtering and payload
//! decoding.
//!
//! Every failure here is per-record and non-fatal: the record is dropped,
//! a skip event is emitted and the caller moves on to the next one.

use crate::events::{PipelineEvent, SharedCounters, SharedSink, SkipReason};
use crate::record::types::{NormalizedRecord, PayloadValue, RawRecord};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Upper sanity bound for epoch-second timestamps.
const MAX_TIMESTAMP_SECS: f64 = 9_999_999_999.0;

/// Substring that marks a source tag as unattributable.
const UNKNOWN_SOURCE_MARKER: &str = "unknown";

/// How non-numeric payload entries are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NormalizePolicy {
    /// Drop non-numeric entries, keep the record (default).
    #[default]
    Lenient,
    /// Any non-numeric entry rejects the whole record.
    Strict,
}

/// Converts raw records into normalized ones, dropping anything that fails
/// validation.
pub struct Normalizer {
    /// Lowercased source tags to keep; `None` applies the default
    /// "unknown" exclusion instead
    filter: Option<Vec<String>>,
    policy: NormalizePolicy,
    events: SharedSink,
    counters: SharedCounters,
}

impl Normalizer {
    pub fn new(
        filter: Option<Vec<String>>,
        policy: NormalizePolicy,
        events: SharedSink,
        counters: SharedCounters,
    ) -> Self {
        Self {
            filter: filter.map(|names| names.iter().map(|name| name.to_lowercase()).collect()),
            policy,
            events,
            counters,
        }
    }

    /// Validate one raw record. Returns `None` when the record is dropped.
    pub fn normalize(&self, raw: &RawRecord) -> Option<NormalizedRecord> {
        self.counters.record_seen();

        let timestamp = match raw.timestamp_secs() {
            Some(ts) if is_valid_timestamp(ts) => ts,
            _ => return self.skip(SkipReason::InvalidTimestamp, raw),
        };

        match raw.name.as_deref().map(str::trim) {
            None | Some("") => return self.skip(SkipReason::MissingSource, raw),
            Some(name) => {
                let lowered = name.to_lowercase();
                match &self.filter {
                    Some(filter) if !filter.iter().any(|wanted| *wanted == lowered) => {
                        return self.skip(SkipReason::FilteredSource, raw);
                    }
                    None if lowered.contains(UNKNOWN_SOURCE_MARKER) => {
                        return self.skip(SkipReason::ExcludedSource, raw);
                    }
                    _ => {}
                }
            }
        }

        let entries = match parse_payload(&raw.data) {
            Some(entries) => entries,
            None => return self.skip(SkipReason::MalformedPayload, raw),
        };

        let mut fields = BTreeMap::new();
        for (name, value) in entries {
            match value.as_number() {
                Some(number) => {
                    fields.insert(name, number);
                }
                None if self.policy == NormalizePolicy::Strict => {
                    return self.skip(SkipReason::NonNumericField, raw);
                }
                None => {}
            }
        }
        if fields.is_empty() {
            return self.skip(SkipReason::NoNumericFields, raw);
        }

        Some(NormalizedRecord { timestamp, fields })
    }

    fn skip(&self, reason: SkipReason, raw: &RawRecord) -> Option<NormalizedRecord> {
        self.counters.record_skipped();
        self.events.emit(PipelineEvent::RecordSkipped {
            reason,
            source: raw.name.clone(),
        });
        None
    }
}

/// A timestamp is plausible when it is a finite positive epoch-second value
/// no later than the year 2286.
pub fn is_valid_timestamp(ts: f64) -> bool {
    ts.is_finite() && ts > 0.0 && ts <= MAX_TIMESTAMP_SECS
}

/// Parse a payload string as a flat object, accepting the single-quoted
/// JSON variant emitted by some capture tools.
fn parse_payload(data: &str) -> Option<BTreeMap<String, PayloadValue>> {
    let normalized: Cow<'_, str> = if data.contains('\'') {
        Cow::Owned(data.replace('\'', "\""))
    } else {
        Cow::Borrowed(data)
    };
    serde_json::from_str(&normalized).ok()
}
