//! Core windowing engine.
//!
//! This module contains:
//! - Per-field aggregate statistics
//! - Sliding-window construction over normalized records

pub mod stats;
pub mod windowing;

// Re-export commonly used types
pub use stats::FieldStats;
pub use windowing::{build_windows, Window};
