//! Payload serialization
//!
//! Turns an ordered slice of events into the bytes of one output
//! object. Order is the caller's; nothing here re-sorts.

use std::collections::BTreeSet;

use bytes::Bytes;
use serde_json::Value;
use sluice_protocol::{Event, OutputFormat};
use thiserror::Error;

/// Errors producing a payload
#[derive(Debug, Error)]
pub enum SerializeError {
    /// A record could not be encoded
    #[error("failed to encode event payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a client's events in the requested format
pub fn serialize(events: &[Event], format: OutputFormat) -> Result<Bytes, SerializeError> {
    match format {
        OutputFormat::Json => to_json_array(events),
        OutputFormat::Jsonl => to_jsonl(events),
        OutputFormat::Csv => to_csv(events),
    }
}

/// One top-level array, compact, element order preserved, no trailing
/// newline
fn to_json_array(events: &[Event]) -> Result<Bytes, SerializeError> {
    let values: Vec<&Value> = events.iter().map(Event::value).collect();
    Ok(Bytes::from(serde_json::to_vec(&values)?))
}

/// One compact object per line, every line terminated
fn to_jsonl(events: &[Event]) -> Result<Bytes, SerializeError> {
    let mut out = Vec::new();
    for event in events {
        serde_json::to_writer(&mut out, event.value())?;
        out.push(b'\n');
    }
    Ok(Bytes::from(out))
}

/// RFC 4180 rows under a derived header
///
/// Header = union of top-level keys across the buffer, sorted
/// lexicographically. Missing fields and nulls emit empty cells;
/// nested values are encoded as compact JSON.
fn to_csv(events: &[Event]) -> Result<Bytes, SerializeError> {
    let mut columns: BTreeSet<&str> = BTreeSet::new();
    for event in events {
        if let Some(object) = event.value().as_object() {
            columns.extend(object.keys().map(String::as_str));
        }
    }

    let mut out = String::new();
    write_row(&mut out, columns.iter().copied());

    for event in events {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| csv_cell(event.value().get(*column)))
            .collect::<Result<_, _>>()?;
        write_row(&mut out, cells.iter().map(String::as_str));
    }

    Ok(Bytes::from(out.into_bytes()))
}

/// Render one value as unquoted cell content
fn csv_cell(value: Option<&Value>) -> Result<String, SerializeError> {
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested @ (Value::Array(_) | Value::Object(_))) => serde_json::to_string(nested)?,
    })
}

/// Write one CRLF-terminated row, quoting cells per RFC 4180
fn write_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        first = false;

        if cell.contains([',', '"', '\r', '\n']) {
            out.push('"');
            for ch in cell.chars() {
                if ch == '"' {
                    out.push('"');
                }
                out.push(ch);
            }
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}

#[cfg(test)]
#[path = "serialize_test.rs"]
mod serialize_test;
