//! JSON sink: a 2-space indented array of flat objects.

use crate::config::WriteMode;
use crate::output::{Cell, Column, SinkError, Tabular};
use std::io::Write;

/// Write items as a JSON array to `out`.
///
/// Single-shot and buffered mode produce identical bytes for the same
/// items; buffered mode flushes after every `chunk_size` objects.
pub fn write_json<T: Tabular, W: Write>(
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
    if items.is_empty() {
        out.write_all(b"[]")?;
        out.flush()?;
        return Ok(());
    }

    let columns = T::columns(items);
    out.write_all(b"[\n")?;
    let mut first = true;
    for chunk in items.chunks(chunk_size) {
        let mut piece = String::new();
        for item in chunk {
            if !first {
                piece.push_str(",\n");
            }
            first = false;
            piece.push_str(&render_object(item, &columns)?);
        }
        out.write_all(piece.as_bytes())?;
        out.flush()?;
    }
    out.write_all(b"\n]")?;
    out.flush()?;
    Ok(())
}

/// Render one item as an indented object with keys in column order.
fn render_object<T: Tabular>(item: &T, columns: &[Column]) -> Result<String, SinkError> {
    let mut body = String::from("  {");
    for (position, column) in columns.iter().enumerate() {
        if position > 0 {
            body.push(',');
        }
        body.push_str("\n    ");
        body.push_str(&serde_json::to_string(&column.header())?);
        body.push_str(": ");
        body.push_str(&json_value(item.cell(column)).to_string());
    }
    body.push_str("\n  }");
    Ok(body)
}

/// JSON representation of a cell. Non-finite values (the undefined
/// single-sample std) and absent fields become `null`.
fn json_value(cell: Cell) -> serde_json::Value {
    match cell {
        Cell::Count(value) => value.into(),
        Cell::Value(value) => serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Cell::Empty => serde_json::Value::Null,
    }
}
