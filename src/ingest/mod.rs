//! Reading raw records from JSON sources.
//!
//! Two input shapes are supported: a full file holding one JSON array of
//! records, and an incremental byte read from a cursor used by watch mode,
//! where newly appended data may be a JSON array or newline-delimited
//! objects.

use crate::events::{PipelineEvent, SharedSink};
use crate::record::RawRecord;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use thiserror::Error;

/// Errors reading a full record file.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} does not contain a JSON record array: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a file containing one JSON array of raw records.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| IngestError::Malformed {
        path: path.display().to_string(),
        source,
    })
}

/// Read all bytes appended after `cursor`, returning them together with the
/// new end-of-data offset.
pub fn read_appended(path: &Path, cursor: u64) -> std::io::Result<(Vec<u8>, u64)> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(cursor))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let end = cursor + bytes.len() as u64;
    Ok((bytes, end))
}

/// Parse a newly appended chunk.
///
/// The chunk is tried as a single JSON array first; on failure it is
/// treated as newline-delimited objects, and each unparseable line is
/// skipped with a warning event.
pub fn parse_chunk(bytes: &[u8], events: &SharedSink) -> Vec<RawRecord> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Ok(records) = serde_json::from_str::<Vec<RawRecord>>(trimmed) {
        return records;
    }

    let mut records = Vec::new();
    for (number, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawRecord>(line) {
            Ok(record) => records.push(record),
            Err(_) => events.emit(PipelineEvent::ChunkLineSkipped { line: number + 1 }),
        }
    }
    records
}

/// The source tags appearing in a record batch, unique, in order of first
/// appearance.
pub fn unique_sources(records: &[RawRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for record in records {
        if let Some(name) = record.name.as_deref() {
            if !name.is_empty() && seen.insert(name.to_string()) {
                names.push(name.to_string());
            }
        }
    }
    names
}
