//! Structured pipeline events and session counters.
//!
//! Components never talk to a global logger. They emit typed events into an
//! injected sink; the production sink forwards them to `tracing`, and tests
//! use a collecting sink to assert on what happened.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Why a record was dropped during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Source tag missing or empty
    MissingSource,
    /// Source tag matched the default "unknown" exclusion
    ExcludedSource,
    /// Source tag not in the configured filter set
    FilteredSource,
    /// Timestamp absent, non-numeric, or outside the plausible range
    InvalidTimestamp,
    /// Payload was not a flat JSON object
    MalformedPayload,
    /// No payload entry carried a number
    NoNumericFields,
    /// Strict policy: a payload entry was non-numeric
    NonNumericField,
}

impl SkipReason {
    /// Short label used in log output.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::MissingSource => "missing_source",
            SkipReason::ExcludedSource => "excluded_source",
            SkipReason::FilteredSource => "filtered_source",
            SkipReason::InvalidTimestamp => "invalid_timestamp",
            SkipReason::MalformedPayload => "malformed_payload",
            SkipReason::NoNumericFields => "no_numeric_fields",
            SkipReason::NonNumericField => "non_numeric_field",
        }
    }
}

/// A structured event emitted by the pipeline.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A record was dropped; always recoverable
    RecordSkipped {
        reason: SkipReason,
        source: Option<String>,
    },
    /// Newly appended records survived normalization
    RecordsIngested { count: usize },
    /// A windowing pass finished
    WindowsBuilt { windows: usize, records: usize },
    /// An artifact was written
    Flushed { destination: String, items: usize },
    /// A pass produced zero windows; no artifact is written
    EmptyResult,
    /// Watched source does not exist yet
    SourceMissing { path: String },
    /// Watched source shrank below the cursor; cursor reset
    SourceTruncated { path: String },
    /// A newline-delimited chunk line failed to parse
    ChunkLineSkipped { line: usize },
    /// Transient read failure; retried on the next tick
    ReadRetry { path: String, error: String },
    /// A flush failed to write; the watch loop keeps going
    WriteFailed { destination: String, error: String },
}

/// Destination for pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Shared event sink handle.
pub type SharedSink = Arc<dyn EventSink>;

/// Sink that forwards events to the `tracing` backbone.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::RecordSkipped { reason, source } => {
                tracing::debug!(
                    reason = reason.label(),
                    source = source.as_deref().unwrap_or("-"),
                    "record skipped"
                );
            }
            PipelineEvent::RecordsIngested { count } => {
                tracing::info!(count, "records ingested");
            }
            PipelineEvent::WindowsBuilt { windows, records } => {
                tracing::info!(windows, records, "windows built");
            }
            PipelineEvent::Flushed { destination, items } => {
                tracing::info!(%destination, items, "output written");
            }
            PipelineEvent::EmptyResult => {
                tracing::info!("no windows produced; skipping output");
            }
            PipelineEvent::SourceMissing { path } => {
                tracing::warn!(%path, "watched source does not exist");
            }
            PipelineEvent::SourceTruncated { path } => {
                tracing::warn!(%path, "watched source shrank; restarting from offset 0");
            }
            PipelineEvent::ChunkLineSkipped { line } => {
                tracing::warn!(line, "skipping unparseable chunk line");
            }
            PipelineEvent::ReadRetry { path, error } => {
                tracing::warn!(%path, %error, "read failed; will retry next tick");
            }
            PipelineEvent::WriteFailed { destination, error } => {
                tracing::error!(%destination, %error, "flush failed");
            }
        }
    }
}

/// Sink that remembers every event, for assertions in tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of skip events with the given reason.
    pub fn skips_with(&self, reason: SkipReason) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, PipelineEvent::RecordSkipped { reason: r, .. } if *r == reason))
            .count()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: PipelineEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Session counters shared across pipeline components.
#[derive(Debug, Default)]
pub struct IngestCounters {
    records_seen: AtomicU64,
    records_skipped: AtomicU64,
    windows_built: AtomicU64,
    flushes: AtomicU64,
}

impl IngestCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a raw record entered normalization.
    pub fn record_seen(&self) {
        self.records_seen.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped record.
    pub fn record_skipped(&self) {
        self.records_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record windows emitted by a build pass.
    pub fn add_windows(&self, count: u64) {
        self.windows_built.fetch_add(count, Ordering::Relaxed);
    }

    /// Record one artifact successfully written.
    pub fn flush_written(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view of the counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            records_seen: self.records_seen.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            windows_built: self.windows_built.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
        }
    }

    /// Human-readable summary for end-of-session display.
    pub fn summary(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            "Session statistics:\n\
             - Records seen: {}\n\
             - Records skipped: {}\n\
             - Windows built: {}\n\
             - Artifacts written: {}",
            snapshot.records_seen,
            snapshot.records_skipped,
            snapshot.windows_built,
            snapshot.flushes
        )
    }
}

/// Snapshot of the session counters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub records_seen: u64,
    pub records_skipped: u64,
    pub windows_built: u64,
    pub flushes: u64,
}

/// Thread-safe shared counters.
pub type SharedCounters = Arc<IngestCounters>;
