//! Raw and normalized record types plus the normalization step.

pub mod normalize;
pub mod types;

// Re-export commonly used types
pub use normalize::{is_valid_timestamp, NormalizePolicy, Normalizer};
pub use types::{NormalizedRecord, PayloadValue, RawRecord};
