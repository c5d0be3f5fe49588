//! Row mapping
//!
//! Converts entries to positional sheet rows and sheet rows back to
//! header-keyed JSON objects.

use serde_json::{Map, Value};

use super::entry::Entry;
use super::schema::{Field, Schema};

/// Lay out an entry as a row following `schema`.
///
/// Absent fields become `""`, except an absent timestamp which becomes
/// `received_at`.
pub fn to_row(entry: &Entry, schema: &Schema, received_at: &str) -> Vec<String> {
    schema
        .columns()
        .iter()
        .map(|&field| match (field, entry.get(field)) {
            (_, Some(value)) => value.to_string(),
            (Field::Timestamp, None) => received_at.to_string(),
            (_, None) => String::new(),
        })
        .collect()
}

/// Zip a header row with a data row.
///
/// Missing trailing cells map to `""`, cells beyond the header are dropped and
/// a repeated header keeps the last value.
pub fn to_entry(header_row: &[String], data_row: &[String]) -> Map<String, Value> {
    let mut object = Map::with_capacity(header_row.len());
    for (index, header) in header_row.iter().enumerate() {
        let cell = data_row.get(index).cloned().unwrap_or_default();
        object.insert(header.clone(), Value::String(cell));
    }
    object
}

/// Convert a full sheet (row 0 = headers) into one object per data row
pub fn to_entries(rows: &[Vec<String>]) -> Vec<Value> {
    let Some((header_row, data_rows)) = rows.split_first() else {
        return Vec::new();
    };
    data_rows
        .iter()
        .map(|row| Value::Object(to_entry(header_row, row)))
        .collect()
}
