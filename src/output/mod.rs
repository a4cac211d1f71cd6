//! Output sinks: CSV and JSON serialization of windows and records.
//!
//! Either item kind is laid out as a flat table: windows carry their index,
//! start and end plus four aggregate columns per field; record exports carry
//! a timestamp plus one column per field. Column sets are the union over the
//! whole collection, in sorted field order, so every row shares one layout.
//!
//! Both sinks produce identical bytes in single-shot and buffered mode;
//! buffered mode bounds memory by flushing fixed-size chunks.

mod csv;
mod json;

pub use self::csv::write_csv;
pub use self::json::write_json;

use crate::config::{OutputFormat, WriteMode};
use crate::core::{FieldStats, Window};
use crate::record::NormalizedRecord;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

/// Errors surfaced by the sinks. A failed write may leave a partially
/// written destination behind; no rollback is attempted.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode csv row: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("failed to encode json value: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which aggregate a window column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Min,
    Max,
    Mean,
    Std,
}

impl StatKind {
    const ALL: [StatKind; 4] = [StatKind::Min, StatKind::Max, StatKind::Mean, StatKind::Std];

    fn prefix(self) -> &'static str {
        match self {
            StatKind::Min => "min",
            StatKind::Max => "max",
            StatKind::Mean => "mean",
            StatKind::Std => "std",
        }
    }

    fn pick(self, stats: &FieldStats) -> f64 {
        match self {
            StatKind::Min => stats.min,
            StatKind::Max => stats.max,
            StatKind::Mean => stats.mean,
            StatKind::Std => stats.std,
        }
    }
}

/// One column of an output table.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    WindowIndex,
    WindowStart,
    WindowEnd,
    /// Aggregate column for a named field
    Stat(StatKind, String),
    Timestamp,
    /// Raw measurement column in record exports
    Field(String),
}

impl Column {
    /// Header text for this column.
    pub fn header(&self) -> String {
        match self {
            Column::WindowIndex => "window_index".to_string(),
            Column::WindowStart => "window_start".to_string(),
            Column::WindowEnd => "window_end".to_string(),
            Column::Stat(kind, field) => format!("{}_{}", kind.prefix(), field),
            Column::Timestamp => "timestamp".to_string(),
            Column::Field(name) => name.clone(),
        }
    }
}

/// A single table cell. `Empty` marks an absent field or an undefined
/// statistic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Count(u64),
    Value(f64),
    Empty,
}

/// Anything the sinks can lay out as a flat table.
pub trait Tabular {
    /// Column layout for a collection; stable for a given input set.
    fn columns(items: &[Self]) -> Vec<Column>
    where
        Self: Sized;

    /// The cell this item contributes under a column.
    fn cell(&self, column: &Column) -> Cell;
}

impl Tabular for Window {
    fn columns(items: &[Self]) -> Vec<Column> {
        let mut fields = BTreeSet::new();
        for window in items {
            fields.extend(window.stats.keys().cloned());
        }

        let mut columns = vec![Column::WindowIndex, Column::WindowStart, Column::WindowEnd];
        for field in fields {
            for kind in StatKind::ALL {
                columns.push(Column::Stat(kind, field.clone()));
            }
        }
        columns
    }

    fn cell(&self, column: &Column) -> Cell {
        match column {
            Column::WindowIndex => Cell::Count(self.index),
            Column::WindowStart => Cell::Value(self.start),
            Column::WindowEnd => Cell::Value(self.end),
            Column::Stat(kind, field) => match self.stats.get(field) {
                Some(stats) => Cell::Value(kind.pick(stats)),
                None => Cell::Empty,
            },
            _ => Cell::Empty,
        }
    }
}

impl Tabular for NormalizedRecord {
    fn columns(items: &[Self]) -> Vec<Column> {
        let mut fields = BTreeSet::new();
        for record in items {
            fields.extend(record.fields.keys().cloned());
        }

        let mut columns = vec![Column::Timestamp];
        columns.extend(fields.into_iter().map(Column::Field));
        columns
    }

    fn cell(&self, column: &Column) -> Cell {
        match column {
            Column::Timestamp => Cell::Value(self.timestamp),
            Column::Field(name) => match self.fields.get(name) {
                Some(value) => Cell::Value(*value),
                None => Cell::Empty,
            },
            _ => Cell::Empty,
        }
    }
}

/// Write items to a file in the given format and mode.
pub fn write_to_path<T: Tabular>(
    items: &[T],
    path: &Path,
    format: OutputFormat,
    mode: WriteMode,
) -> Result<(), SinkError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    match format {
        OutputFormat::Csv => write_csv(items, &mut out, mode),
        OutputFormat::Json => write_json(items, &mut out, mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn window(index: u64, fields: &[(&str, f64)]) -> Window {
        let stats = fields
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    FieldStats {
                        min: *value,
                        max: *value,
                        mean: *value,
                        std: f64::NAN,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        Window {
            index,
            start: 0.0,
            end: 1.0,
            stats,
        }
    }

    #[test]
    fn window_columns_are_union_in_sorted_order() {
        let windows = vec![window(0, &[("b", 1.0)]), window(1, &[("a", 2.0)])];
        let headers: Vec<String> = Window::columns(&windows).iter().map(Column::header).collect();

        assert_eq!(
            headers,
            [
                "window_index",
                "window_start",
                "window_end",
                "min_a",
                "max_a",
                "mean_a",
                "std_a",
                "min_b",
                "max_b",
                "mean_b",
                "std_b",
            ]
        );
    }

    #[test]
    fn missing_field_yields_empty_cell() {
        let windows = vec![window(0, &[("a", 1.0)]), window(1, &[("b", 2.0)])];
        let columns = Window::columns(&windows);

        let b_min = columns
            .iter()
            .find(|c| c.header() == "min_b")
            .expect("column exists");
        assert_eq!(windows[0].cell(b_min), Cell::Empty);
        assert_eq!(windows[1].cell(b_min), Cell::Value(2.0));
    }

    #[test]
    fn record_columns_start_with_timestamp() {
        let records = vec![
            NormalizedRecord::new(1.0, [("speed".to_string(), 15.48)]),
            NormalizedRecord::new(2.0, [("brake".to_string(), 39.0)]),
        ];
        let headers: Vec<String> = NormalizedRecord::columns(&records)
            .iter()
            .map(Column::header)
            .collect();

        assert_eq!(headers, ["timestamp", "brake", "speed"]);
    }
}
