//! Semicolon-delimited CSV sink with a UTF-8 byte-order mark.

use crate::config::WriteMode;
use crate::output::{Cell, Column, SinkError, Tabular};
use csv::WriterBuilder;
use std::io::Write;

/// Byte-order mark written ahead of the header so spreadsheet imports
/// detect the encoding.
const BOM: &[u8] = "\u{feff}".as_bytes();

/// Write items as CSV to `out`.
///
/// Single-shot and buffered mode produce identical bytes for the same
/// items; buffered mode flushes after every `chunk_size` rows.
pub fn write_csv<T: Tabular, W: Write>(
    items: &[T],
    out: &mut W,
    mode: WriteMode,
) -> Result<(), SinkError> {
    match mode {
        WriteMode::SingleShot => {
            let mut buf = Vec::new();
            encode(items, &mut buf, items.len().max(1))?;
            out.write_all(&buf)?;
            out.flush()?;
            Ok(())
        }
        WriteMode::Buffered { chunk_size } => encode(items, out, chunk_size.max(1)),
    }
}

fn encode<T: Tabular, W: Write>(
    items: &[T],
    out: &mut W,
    chunk_size: usize,
) -> Result<(), SinkError> {
    let columns = T::columns(items);

    out.write_all(BOM)?;
    out.write_all(&render_record(columns.iter().map(Column::header))?)?;
    out.flush()?;

    for chunk in items.chunks(chunk_size) {
        let mut buf = Vec::new();
        for item in chunk {
            buf.extend(render_record(
                columns.iter().map(|column| csv_field(item.cell(column))),
            )?);
        }
        out.write_all(&buf)?;
        out.flush()?;
    }
    Ok(())
}

/// Encode one row, delimiter and quoting applied by the csv writer.
fn render_record(fields: impl Iterator<Item = String>) -> Result<Vec<u8>, SinkError> {
    let mut writer = WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|error| SinkError::Io(error.into_error()))
}

/// Cell text for CSV. Non-finite values (the undefined single-sample std)
/// and absent fields serialize as empty cells.
fn csv_field(cell: Cell) -> String {
    match cell {
        Cell::Count(value) => value.to_string(),
        Cell::Value(value) if value.is_finite() => value.to_string(),
        _ => String::new(),
    }
}
