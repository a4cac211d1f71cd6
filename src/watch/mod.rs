//! Watch mode: tailing a growing record source.
//!
//! The watcher is a cooperative polling loop around the batch pipeline.
//! Each tick reads the bytes appended since the last cursor position,
//! normalizes the new records into a pending buffer, and flushes a
//! windowing pass once a window length of wall-clock time has elapsed
//! since the previous flush. Time is injected so ticks can be driven
//! deterministically in tests.

use crate::config::{OutputTarget, WindowSpec, WriteMode};
use crate::core::build_windows;
use crate::events::{PipelineEvent, SharedCounters, SharedSink};
use crate::ingest;
use crate::output;
use crate::record::{NormalizedRecord, Normalizer};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Time source for the watcher loop.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in epoch seconds.
    fn now(&self) -> f64;
}

/// Clock backed by the system time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs_f64(),
            Err(_) => 0.0,
        }
    }
}

/// Lifecycle of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Watching,
    Stopped,
}

/// Static configuration for a watch session.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Source file to tail
    pub source: PathBuf,
    /// Window geometry; the length also paces flushes
    pub spec: WindowSpec,
    /// Destinations for each flush; names are stamped with the flush time
    pub targets: Vec<OutputTarget>,
    pub mode: WriteMode,
    /// Pause between polls
    pub interval: Duration,
}

/// Polls a record source and periodically windows newly appended data.
///
/// Unwindowed pending records are dropped when the session stops; only
/// flushes triggered by the pacing rule produce output.
pub struct Watcher {
    config: WatcherConfig,
    normalizer: Normalizer,
    clock: Arc<dyn Clock>,
    events: SharedSink,
    counters: SharedCounters,
    state: WatcherState,
    cursor: u64,
    last_mtime: Option<SystemTime>,
    pending: Vec<NormalizedRecord>,
    last_flush: f64,
}

impl Watcher {
    pub fn new(
        config: WatcherConfig,
        normalizer: Normalizer,
        clock: Arc<dyn Clock>,
        events: SharedSink,
        counters: SharedCounters,
    ) -> Self {
        let last_flush = clock.now();
        Self {
            config,
            normalizer,
            clock,
            events,
            counters,
            state: WatcherState::Idle,
            cursor: 0,
            last_mtime: None,
            pending: Vec::new(),
            last_flush,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Byte offset of consumed source data.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Records waiting for the next windowing pass.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Run until the cancellation channel fires or disconnects.
    pub fn run(&mut self, cancel: &Receiver<()>) {
        self.state = WatcherState::Watching;
        loop {
            self.tick();
            match cancel.recv_timeout(self.config.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.state = WatcherState::Stopped;
    }

    /// One poll cycle: ingest newly appended data, then flush if a window
    /// length of wall-clock time has passed.
    pub fn tick(&mut self) {
        self.ingest_new_data();
        self.maybe_flush();
    }

    fn ingest_new_data(&mut self) {
        let meta = match std::fs::metadata(&self.config.source) {
            Ok(meta) => meta,
            Err(_) => {
                self.events.emit(PipelineEvent::SourceMissing {
                    path: self.config.source.display().to_string(),
                });
                return;
            }
        };

        if meta.len() < self.cursor {
            self.events.emit(PipelineEvent::SourceTruncated {
                path: self.config.source.display().to_string(),
            });
            self.cursor = 0;
        }

        let mtime = meta.modified().ok();
        if self.last_mtime.is_some() && mtime == self.last_mtime && meta.len() == self.cursor {
            return;
        }

        match ingest::read_appended(&self.config.source, self.cursor) {
            Ok((bytes, end)) => {
                self.cursor = end;
                self.last_mtime = mtime;
                if bytes.is_empty() {
                    return;
                }
                let raws = ingest::parse_chunk(&bytes, &self.events);
                let normalizer = &self.normalizer;
                let fresh: Vec<NormalizedRecord> =
                    raws.iter().filter_map(|raw| normalizer.normalize(raw)).collect();
                if !fresh.is_empty() {
                    self.events.emit(PipelineEvent::RecordsIngested { count: fresh.len() });
                    self.pending.extend(fresh);
                }
            }
            Err(error) => {
                // Transient: a partial write or vanished file is retried on
                // the next tick.
                self.events.emit(PipelineEvent::ReadRetry {
                    path: self.config.source.display().to_string(),
                    error: error.to_string(),
                });
            }
        }
    }

    fn maybe_flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let now = self.clock.now();
        if now - self.last_flush < self.config.spec.length() {
            return;
        }

        let records = std::mem::take(&mut self.pending);
        let record_count = records.len();
        self.last_flush = now;

        let windows = build_windows(records, &self.config.spec);
        self.counters.add_windows(windows.len() as u64);
        self.events.emit(PipelineEvent::WindowsBuilt {
            windows: windows.len(),
            records: record_count,
        });

        if windows.is_empty() {
            self.events.emit(PipelineEvent::EmptyResult);
            return;
        }

        for target in &self.config.targets {
            let destination = stamped_path(&target.path, now);
            match output::write_to_path(&windows, &destination, target.format, self.config.mode) {
                Ok(()) => {
                    self.counters.flush_written();
                    self.events.emit(PipelineEvent::Flushed {
                        destination: destination.display().to_string(),
                        items: windows.len(),
                    });
                }
                Err(error) => {
                    self.events.emit(PipelineEvent::WriteFailed {
                        destination: destination.display().to_string(),
                        error: error.to_string(),
                    });
                }
            }
        }
    }
}

/// Stamp a destination name with the flush time so successive flushes never
/// overwrite each other: `windows.csv` becomes
/// `windows_20240606_102900.csv`.
fn stamped_path(path: &Path, now: f64) -> PathBuf {
    let stamp = chrono::DateTime::<chrono::Utc>::from_timestamp(now as i64, 0)
        .map(|time| time.format("%Y%m%d_%H%M%S").to_string())
        .unwrap_or_else(|| (now as i64).to_string());

    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("windows");
    let name = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{stem}_{stamp}.{ext}"),
        None => format!("{stem}_{stamp}"),
    };
    path.with_file_name(name)
}
