//! Sliding-window statistics over time-stamped sensor records.
//!
//! Records arrive with a source tag and a flat payload of named
//! measurements. The pipeline validates them, buckets them into
//! fixed-length (optionally overlapping) time windows, and annotates every
//! window with per-field aggregates: min, max, mean and sample standard
//! deviation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       sensor-windower                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐    ┌─────────────┐    ┌─────────────┐       │
//! │  │ Normalizer │──▶│   Window    │──▶│ Output Sink │       │
//! │  │ (validate) │    │   Builder   │    │ (csv/json)  │       │
//! │  └────────────┘    └─────────────┘    └─────────────┘       │
//! │        ▲                                     │              │
//! │        │           ┌─────────────┐           ▼              │
//! │        └───────────│   Watcher   │    artifacts on disk     │
//! │                    │  (tailing)  │                          │
//! │                    └─────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Batch mode runs the chain once over a full input file; watch mode
//! ([`watch::Watcher`]) wraps the same chain in a polling loop that tails a
//! growing source and flushes a windowing pass at most once per window
//! length.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sensor_windower::{
//!     build_windows, IngestCounters, NormalizePolicy, Normalizer, TracingSink, WindowSpec,
//! };
//!
//! let spec = WindowSpec::new(2.0, Some(1.0)).expect("positive length and step");
//! let normalizer = Normalizer::new(
//!     None,
//!     NormalizePolicy::Lenient,
//!     Arc::new(TracingSink),
//!     Arc::new(IngestCounters::new()),
//! );
//!
//! let raws = sensor_windower::ingest::read_records("records.json".as_ref())
//!     .expect("readable input");
//! let records: Vec<_> = raws.iter().filter_map(|raw| normalizer.normalize(raw)).collect();
//! let windows = build_windows(records, &spec);
//! ```

pub mod config;
pub mod core;
pub mod events;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod watch;

// Re-export key types at crate root for convenience
pub use config::{ConfigError, OutputFormat, OutputTarget, WindowSpec, WriteMode};
pub use core::{build_windows, FieldStats, Window};
pub use events::{
    CollectingSink, EventSink, IngestCounters, PipelineEvent, SharedCounters, SharedSink,
    SkipReason, TracingSink,
};
pub use output::{write_csv, write_json, SinkError, Tabular};
pub use record::{NormalizePolicy, NormalizedRecord, Normalizer, PayloadValue, RawRecord};
pub use watch::{Clock, SystemClock, Watcher, WatcherConfig, WatcherState};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
