//! Batch decoder implementation.

use std::collections::HashSet;

use serde_json::{Map, Number, Value};

use crate::batch::{
    BatchHeader, ColumnSchema, ColumnType, COLUMN_TRAILER_SIZE, HEADER_SIZE, MIN_COLUMN_SIZE,
};
use crate::errors::CodecError;
use crate::row::Row;

/// A decoded batch: the declared schema plus its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBatch {
    /// Columns in the order the batch declared them.
    pub columns: Vec<ColumnSchema>,
    /// Rows, one map per row, keyed by column name.
    pub rows: Vec<Row>,
}

/// Cursor over an in-memory batch payload.
///
/// Every read checks the declared length against the bytes actually left,
/// so a lying length prefix fails before anything is allocated for it.
pub struct BatchReader<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> BatchReader<'a> {
    /// Creates a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, position: 0 }
    }

    /// Returns the current read offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.position
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], CodecError> {
        if needed > self.remaining() {
            return Err(CodecError::Truncated {
                offset: self.position,
                needed,
                available: self.remaining(),
            });
        }
        let start = self.position;
        self.position += needed;
        Ok(&self.buf[start..self.position])
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    /// Reads and validates the batch header.
    pub fn read_header(&mut self) -> Result<BatchHeader, CodecError> {
        let header = BatchHeader::from_bytes(self.buf)?;
        self.position = HEADER_SIZE;

        // Every column carries at least its trailer and a full validity bitmap.
        let min_column = MIN_COLUMN_SIZE.saturating_add(header.bitmap_len());
        let min_bytes = (header.column_count as usize).saturating_mul(min_column);
        if min_bytes > self.remaining() {
            return Err(CodecError::Truncated {
                offset: self.position,
                needed: min_bytes,
                available: self.remaining(),
            });
        }
        Ok(header)
    }

    /// Reads one column block and appends its cells to `rows`.
    fn read_column(
        &mut self,
        rows: &mut [Row],
        bitmap_len: usize,
    ) -> Result<ColumnSchema, CodecError> {
        let name_len = self.read_u16()? as usize;
        let name_bytes = self.take(name_len)?;
        let name = std::str::from_utf8(name_bytes)
            .map_err(|_| CodecError::InvalidColumn {
                column: String::from_utf8_lossy(name_bytes).into_owned(),
                reason: "column name is not valid UTF-8".to_string(),
            })?
            .to_string();

        let trailer_offset = self.position;
        let trailer = self.take(COLUMN_TRAILER_SIZE)?;
        let tag = trailer[0];
        if trailer[1..4] != [0u8; 3] {
            return Err(CodecError::InvalidColumn {
                column: name,
                reason: format!("non-zero reserved bytes at offset {}", trailer_offset + 1),
            });
        }
        let body_len =
            u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]) as usize;
        let column_type =
            ColumnType::from_byte(tag).ok_or_else(|| CodecError::UnsupportedColumnType {
                column: name.clone(),
                tag,
            })?;

        let body_offset = self.position;
        let body = self.take(body_len)?;
        let mut column = ColumnReader {
            inner: BatchReader {
                buf: body,
                position: 0,
            },
            base: body_offset,
            name: &name,
        };

        let bitmap = column.take(bitmap_len)?;
        for (index, row) in rows.iter_mut().enumerate() {
            let present = bitmap[index / 8] & (1 << (index % 8)) != 0;
            let value = if present {
                column.read_value(column_type)?
            } else {
                Value::Null
            };
            row.insert(name.clone(), value);
        }

        let unused = column.inner.remaining();
        if unused != 0 {
            return Err(CodecError::InvalidColumn {
                column: name,
                reason: format!("{} unused bytes at end of column body", unused),
            });
        }

        Ok(ColumnSchema { name, column_type })
    }
}

/// Reader scoped to a single column body, used for cell values.
struct ColumnReader<'a, 'n> {
    inner: BatchReader<'a>,
    base: usize,
    name: &'n str,
}

impl<'a> ColumnReader<'a, '_> {
    fn rebase(&self, err: CodecError) -> CodecError {
        match err {
            CodecError::Truncated {
                offset,
                needed,
                available,
            } => CodecError::Truncated {
                offset: self.base + offset,
                needed,
                available,
            },
            other => other,
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> CodecError {
        CodecError::InvalidColumn {
            column: self.name.to_string(),
            reason: reason.into(),
        }
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], CodecError> {
        self.inner.take(needed).map_err(|e| self.rebase(e))
    }

    fn read_value(&mut self, column_type: ColumnType) -> Result<Value, CodecError> {
        match column_type {
            ColumnType::Null => Err(self.invalid("null column marks a cell as present")),
            ColumnType::Bool => match self.inner.read_u8().map_err(|e| self.rebase(e))? {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                other => Err(self.invalid(format!("invalid bool byte 0x{:02x}", other))),
            },
            ColumnType::Int64 => {
                let raw = self.inner.read_u64().map_err(|e| self.rebase(e))?;
                Ok(Value::Number(Number::from(raw as i64)))
            }
            ColumnType::Float64 => {
                let raw = self.inner.read_u64().map_err(|e| self.rebase(e))?;
                let float = f64::from_bits(raw);
                Number::from_f64(float)
                    .map(Value::Number)
                    .ok_or_else(|| self.invalid(format!("non-finite float {}", float)))
            }
            ColumnType::Utf8 => {
                let bytes = self.read_sized()?;
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| self.invalid("string cell is not valid UTF-8"))?;
                Ok(Value::String(text.to_string()))
            }
            ColumnType::Json => {
                let bytes = self.read_sized()?;
                serde_json::from_slice(bytes)
                    .map_err(|e| self.invalid(format!("json cell does not parse: {}", e)))
            }
        }
    }

    fn read_sized(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.inner.read_u32().map_err(|e| self.rebase(e))? as usize;
        self.take(len)
    }
}

/// Decodes a batch, keeping the declared schema alongside the rows.
///
/// # Errors
///
/// Returns [`CodecError`] if:
/// - The payload is empty or shorter than a header
/// - Magic, version, or flags are wrong
/// - Any declared length exceeds the bytes present
/// - A column name repeats, a type tag is unknown, or a cell is malformed
/// - Bytes remain after the last column
pub fn decode_batch(bytes: &[u8]) -> Result<DecodedBatch, CodecError> {
    let mut reader = BatchReader::new(bytes);
    let header = reader.read_header()?;
    let bitmap_len = header.bitmap_len();

    let mut rows: Vec<Row> = (0..header.row_count).map(|_| Map::new()).collect();
    let mut columns = Vec::with_capacity(header.column_count as usize);
    let mut seen = HashSet::with_capacity(header.column_count as usize);

    for _ in 0..header.column_count {
        let schema = reader.read_column(&mut rows, bitmap_len)?;
        if !seen.insert(schema.name.clone()) {
            return Err(CodecError::DuplicateColumn(schema.name));
        }
        columns.push(schema);
    }

    if reader.remaining() != 0 {
        return Err(CodecError::TrailingBytes {
            offset: reader.position(),
            remaining: reader.remaining(),
        });
    }

    Ok(DecodedBatch { columns, rows })
}

/// Decodes a batch into rows.
///
/// Every column present in the batch appears as a key in each row; absent
/// cells decode to `null`. No column is required at this layer.
pub fn decode(bytes: &[u8]) -> Result<Vec<Row>, CodecError> {
    decode_batch(bytes).map(|batch| batch.rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchHeader, TYPE_BOOL, TYPE_INT64, TYPE_UTF8};

    fn column(name: &str, tag: u8, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.push(tag);
        out.extend_from_slice(&[0, 0, 0]);
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn batch(rows: u32, columns: &[Vec<u8>]) -> Vec<u8> {
        let mut out = BatchHeader::new(columns.len() as u32, rows).to_bytes().to_vec();
        for c in columns {
            out.extend_from_slice(c);
        }
        out
    }

    #[test]
    fn decodes_hand_built_batch() {
        let mut ids = vec![0b0000_0011];
        for s in ["e1", "e2"] {
            ids.extend_from_slice(&(s.len() as u32).to_le_bytes());
            ids.extend_from_slice(s.as_bytes());
        }
        let mut ts = vec![0b0000_0010];
        ts.extend_from_slice(&1_700_000_000i64.to_le_bytes());

        let bytes = batch(
            2,
            &[column("entity_id", TYPE_UTF8, &ids), column("timestamp", TYPE_INT64, &ts)],
        );
        let rows = decode(&bytes).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["entity_id"], "e1");
        assert_eq!(rows[0]["timestamp"], Value::Null);
        assert_eq!(rows[1]["entity_id"], "e2");
        assert_eq!(rows[1]["timestamp"], 1_700_000_000);
    }

    #[test]
    fn zero_columns_zero_rows_is_empty_batch() {
        let bytes = batch(0, &[]);
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn rejects_invalid_bool_byte() {
        let bytes = batch(1, &[column("flag", TYPE_BOOL, &[0b1, 0x07])]);
        assert!(matches!(decode(&bytes), Err(CodecError::InvalidColumn { .. })));
    }

    #[test]
    fn rejects_unused_body_bytes() {
        let bytes = batch(1, &[column("flag", TYPE_BOOL, &[0b1, 0x01, 0xAA])]);
        assert!(matches!(decode(&bytes), Err(CodecError::InvalidColumn { .. })));
    }

    #[test]
    fn rejects_unknown_type_tag() {
        let bytes = batch(1, &[column("x", 0x42, &[0])]);
        assert_eq!(
            decode(&bytes),
            Err(CodecError::UnsupportedColumnType {
                column: "x".to_string(),
                tag: 0x42
            })
        );
    }

    #[test]
    fn rejects_non_zero_reserved_bytes() {
        let mut col = column("x", TYPE_BOOL, &[0]);
        col[2 + 1 + 1] = 0x01;
        let bytes = batch(1, &[col]);
        assert!(matches!(decode(&bytes), Err(CodecError::InvalidColumn { .. })));
    }

    #[test]
    fn rejects_string_length_past_body() {
        let mut body = vec![0b1];
        body.extend_from_slice(&100u32.to_le_bytes());
        body.extend_from_slice(b"abc");
        let bytes = batch(1, &[column("s", TYPE_UTF8, &body)]);
        assert!(matches!(decode(&bytes), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn truncation_offset_is_absolute() {
        let mut body = vec![0b1];
        body.extend_from_slice(&100u32.to_le_bytes());
        let bytes = batch(1, &[column("s", TYPE_UTF8, &body)]);
        match decode(&bytes) {
            Err(CodecError::Truncated { offset, .. }) => {
                // header + name prefix + name + trailer + bitmap + length prefix
                assert_eq!(offset, 16 + 2 + 1 + 8 + 1 + 4);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }
}
