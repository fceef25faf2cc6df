//! Batch encoder implementation.

use std::collections::HashMap;

use serde_json::Value;

use crate::batch::{bitmap_len, BatchHeader, ColumnType, MAX_ROWS};
use crate::errors::CodecError;
use crate::row::Row;

/// Accumulates rows and encodes them as a single batch.
///
/// Columns appear in first-seen order across the pushed rows. A row that
/// lacks a column encodes a null cell for it.
///
/// # Example
///
/// ```rust
/// use tessera_codec::{BatchWriter, decode};
/// use serde_json::json;
///
/// let mut writer = BatchWriter::new();
/// writer.push_value(json!({"entity_id": "e1", "timestamp": 1}))?;
/// writer.push_value(json!({"entity_id": "e2"}))?;
/// let bytes = writer.finish()?;
///
/// let rows = decode(&bytes)?;
/// assert!(rows[1]["timestamp"].is_null());
/// # Ok::<(), tessera_codec::CodecError>(())
/// ```
#[derive(Debug, Default)]
pub struct BatchWriter {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Row>,
}

impl BatchWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows pushed so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows have been pushed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row.
    pub fn push(&mut self, row: Row) -> Result<(), CodecError> {
        if self.rows.len() >= MAX_ROWS as usize {
            return Err(CodecError::TooManyRows {
                rows: MAX_ROWS.saturating_add(1),
                max: MAX_ROWS,
            });
        }
        for key in row.keys() {
            if !self.index.contains_key(key) {
                if key.len() > u16::MAX as usize {
                    return Err(CodecError::Encode(format!(
                        "column name of {} bytes exceeds {}",
                        key.len(),
                        u16::MAX
                    )));
                }
                self.index.insert(key.clone(), self.columns.len());
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends a JSON object as a row.
    pub fn push_value(&mut self, value: Value) -> Result<(), CodecError> {
        match value {
            Value::Object(map) => self.push(map),
            other => Err(CodecError::Encode(format!(
                "row must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Encodes all pushed rows.
    pub fn finish(self) -> Result<Vec<u8>, CodecError> {
        let row_count = self.rows.len() as u32;
        let header = BatchHeader::new(self.columns.len() as u32, row_count);
        let mut out = header.to_bytes().to_vec();

        for name in &self.columns {
            let cells: Vec<&Value> = self
                .rows
                .iter()
                .map(|row| row.get(name).unwrap_or(&Value::Null))
                .collect();
            let column_type = infer_type(&cells);
            let body = encode_body(name, column_type, &cells)?;
            let body_len = u32::try_from(body.len()).map_err(|_| {
                CodecError::Encode(format!("column '{}' body exceeds 4 GiB", name))
            })?;

            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.push(column_type.to_byte());
            out.extend_from_slice(&[0u8; 3]);
            out.extend_from_slice(&body_len.to_le_bytes());
            out.extend_from_slice(&body);
        }

        Ok(out)
    }
}

/// Encodes `rows` as a single batch.
pub fn encode(rows: &[Row]) -> Result<Vec<u8>, CodecError> {
    let mut writer = BatchWriter::new();
    for row in rows {
        writer.push(row.clone())?;
    }
    writer.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Bool,
    Int,
    Float,
    Str,
    Other,
}

fn classify(value: &Value) -> Option<CellKind> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(CellKind::Bool),
        Value::Number(n) if n.is_i64() => Some(CellKind::Int),
        // u64 above i64::MAX would lose precision in a float column
        Value::Number(n) if n.is_u64() => Some(CellKind::Other),
        Value::Number(_) => Some(CellKind::Float),
        Value::String(_) => Some(CellKind::Str),
        Value::Array(_) | Value::Object(_) => Some(CellKind::Other),
    }
}

/// Largest integer magnitude every f64 represents exactly.
const MAX_EXACT_FLOAT_INT: u64 = 1 << 53;

/// Picks the narrowest column type that represents every non-null cell.
///
/// Integers only widen into a float column if none of them would round.
fn infer_type(cells: &[&Value]) -> ColumnType {
    let mut kind: Option<CellKind> = None;
    let mut inexact_int = false;
    for cell in cells {
        let Some(next) = classify(cell) else {
            continue;
        };
        if next == CellKind::Int {
            inexact_int |= cell
                .as_i64()
                .map_or(true, |v| v.unsigned_abs() > MAX_EXACT_FLOAT_INT);
        }
        kind = Some(match (kind, next) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(CellKind::Int), CellKind::Float) | (Some(CellKind::Float), CellKind::Int) => {
                CellKind::Float
            }
            _ => return ColumnType::Json,
        });
    }
    match kind {
        None => ColumnType::Null,
        Some(CellKind::Bool) => ColumnType::Bool,
        Some(CellKind::Int) => ColumnType::Int64,
        Some(CellKind::Float) if inexact_int => ColumnType::Json,
        Some(CellKind::Float) => ColumnType::Float64,
        Some(CellKind::Str) => ColumnType::Utf8,
        Some(CellKind::Other) => ColumnType::Json,
    }
}

fn encode_body(
    name: &str,
    column_type: ColumnType,
    cells: &[&Value],
) -> Result<Vec<u8>, CodecError> {
    let mut bitmap = vec![0u8; bitmap_len(cells.len())];
    let mut values = Vec::new();

    for (index, cell) in cells.iter().enumerate() {
        if cell.is_null() {
            continue;
        }
        bitmap[index / 8] |= 1 << (index % 8);
        match column_type {
            ColumnType::Null => {}
            ColumnType::Bool => values.push(u8::from(cell.as_bool() == Some(true))),
            ColumnType::Int64 => {
                let v = cell.as_i64().ok_or_else(|| mistyped(name, cell))?;
                values.extend_from_slice(&v.to_le_bytes());
            }
            ColumnType::Float64 => {
                let v = cell.as_f64().ok_or_else(|| mistyped(name, cell))?;
                values.extend_from_slice(&v.to_bits().to_le_bytes());
            }
            ColumnType::Utf8 => {
                let s = cell.as_str().ok_or_else(|| mistyped(name, cell))?;
                push_sized(&mut values, name, s.as_bytes())?;
            }
            ColumnType::Json => {
                let text = serde_json::to_vec(cell)
                    .map_err(|e| CodecError::Encode(format!("column '{}': {}", name, e)))?;
                push_sized(&mut values, name, &text)?;
            }
        }
    }

    let mut body = bitmap;
    body.extend_from_slice(&values);
    Ok(body)
}

fn push_sized(out: &mut Vec<u8>, name: &str, bytes: &[u8]) -> Result<(), CodecError> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| CodecError::Encode(format!("cell in column '{}' exceeds 4 GiB", name)))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

fn mistyped(name: &str, cell: &Value) -> CodecError {
    CodecError::Encode(format!(
        "column '{}' cannot hold {} value",
        name,
        json_kind(cell)
    ))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
