//! Configuration types for windowing and output.
//!
//! All numeric parameters are validated at construction, before any record
//! is processed.

use std::path::PathBuf;
use thiserror::Error;

/// Window geometry: a fixed length plus the advance between window starts.
///
/// When the step is smaller than the length, windows overlap; when equal
/// (the default), windows are adjacent and non-overlapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    length: f64,
    step: f64,
}

impl WindowSpec {
    /// Validate a window length and optional step. The step defaults to the
    /// length.
    pub fn new(length: f64, step: Option<f64>) -> Result<Self, ConfigError> {
        if !length.is_finite() || length <= 0.0 {
            return Err(ConfigError::InvalidLength(length));
        }
        let step = step.unwrap_or(length);
        if !step.is_finite() || step <= 0.0 {
            return Err(ConfigError::InvalidStep(step));
        }
        Ok(Self { length, step })
    }

    /// Window length in seconds.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Advance between window starts in seconds.
    pub fn step(&self) -> f64 {
        self.step
    }
}

/// Serialization format for an output artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

/// One output destination.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub format: OutputFormat,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

/// How an artifact is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Serialize the whole collection, then one write call.
    SingleShot,
    /// Write in chunks of `chunk_size` items, flushing after each chunk.
    Buffered { chunk_size: usize },
}

impl WriteMode {
    /// Buffered mode with a validated chunk size.
    pub fn buffered(chunk_size: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(WriteMode::Buffered { chunk_size })
    }
}

/// Configuration errors, raised before any processing begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("window length must be a positive number, got {0}")]
    InvalidLength(f64),
    #[error("window step must be a positive number, got {0}")]
    InvalidStep(f64),
    #[error("chunk size must be at least 1")]
    InvalidChunkSize,
}
