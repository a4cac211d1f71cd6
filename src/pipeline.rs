//! Batch orchestration: one pass from raw records to output artifacts.

use crate::config::{OutputTarget, WindowSpec, WriteMode};
use crate::core::{build_windows, Window};
use crate::events::{PipelineEvent, SharedCounters, SharedSink};
use crate::output::{self, SinkError, Tabular};
use crate::record::{NormalizedRecord, Normalizer, RawRecord};

/// Normalize a raw batch, dropping every record that fails validation.
pub fn normalize_records(raws: &[RawRecord], normalizer: &Normalizer) -> Vec<NormalizedRecord> {
    raws.iter().filter_map(|raw| normalizer.normalize(raw)).collect()
}

/// Build windows over an already-normalized batch.
pub fn window_records(
    records: Vec<NormalizedRecord>,
    raw_count: usize,
    spec: &WindowSpec,
    events: &SharedSink,
    counters: &SharedCounters,
) -> Vec<Window> {
    let windows = build_windows(records, spec);

    counters.add_windows(windows.len() as u64);
    events.emit(PipelineEvent::WindowsBuilt {
        windows: windows.len(),
        records: raw_count,
    });
    windows
}

/// Normalize a raw batch and build its windows.
pub fn process_records(
    raws: &[RawRecord],
    normalizer: &Normalizer,
    spec: &WindowSpec,
    events: &SharedSink,
    counters: &SharedCounters,
) -> Vec<Window> {
    let records = normalize_records(raws, normalizer);
    window_records(records, raws.len(), spec, events, counters)
}

/// Write items to every target. Zero items is not an error: an info event
/// is emitted and no artifact is produced.
pub fn write_outputs<T: Tabular>(
    items: &[T],
    targets: &[OutputTarget],
    mode: WriteMode,
    events: &SharedSink,
    counters: &SharedCounters,
) -> Result<(), SinkError> {
    if items.is_empty() {
        events.emit(PipelineEvent::EmptyResult);
        return Ok(());
    }

    for target in targets {
        output::write_to_path(items, &target.path, target.format, mode)?;
        counters.flush_written();
        events.emit(PipelineEvent::Flushed {
            destination: target.path.display().to_string(),
            items: items.len(),
        });
    }
    Ok(())
}
