use crate::errors::CodecError;

/// Batch magic bytes: `b"TCB1"`.
pub const MAGIC: &[u8; 4] = b"TCB1";

/// Current batch format version: `0x0001`.
pub const VERSION: u16 = 0x0001;

/// Batch header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Fixed part of a column header following the name: type tag, 3 reserved bytes, body length.
pub const COLUMN_TRAILER_SIZE: usize = 8;

/// Smallest possible encoded column: name length prefix plus the fixed trailer.
pub const MIN_COLUMN_SIZE: usize = 2 + COLUMN_TRAILER_SIZE;

/// Maximum rows a single batch may declare.
pub const MAX_ROWS: u32 = 1 << 20;

/// Column type tag: every cell is null.
pub const TYPE_NULL: u8 = 0x00;
/// Column type tag: one byte per present cell, 0 or 1.
pub const TYPE_BOOL: u8 = 0x01;
/// Column type tag: little-endian i64 per present cell.
pub const TYPE_INT64: u8 = 0x02;
/// Column type tag: little-endian IEEE-754 f64 per present cell.
pub const TYPE_FLOAT64: u8 = 0x03;
/// Column type tag: u32 length followed by UTF-8 bytes per present cell.
pub const TYPE_UTF8: u8 = 0x04;
/// Column type tag: u32 length followed by JSON text per present cell.
pub const TYPE_JSON: u8 = 0x05;

/// Batch header (16 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHeader {
    /// Magic bytes: `"TCB1"`.
    pub magic: [u8; 4],
    /// Format version: `0x0001`.
    pub version: u16,
    /// Reserved flags (must be 0).
    pub flags: u16,
    /// Number of column blocks that follow.
    pub column_count: u32,
    /// Number of rows every column covers.
    pub row_count: u32,
}

impl BatchHeader {
    /// Creates a header for the given shape.
    pub fn new(column_count: u32, row_count: u32) -> Self {
        Self {
            magic: *MAGIC,
            version: VERSION,
            flags: 0,
            column_count,
            row_count,
        }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.flags.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.column_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.row_count.to_le_bytes());
        bytes
    }

    /// Deserializes a header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::Empty);
        }
        if bytes.len() < HEADER_SIZE {
            return Err(CodecError::Truncated {
                offset: 0,
                needed: HEADER_SIZE,
                available: bytes.len(),
            });
        }

        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != *MAGIC {
            return Err(CodecError::InvalidHeader(format!(
                "invalid magic: {:?}, expected {:?}",
                magic, MAGIC
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let flags = u16::from_le_bytes([bytes[6], bytes[7]]);
        if flags != 0 {
            return Err(CodecError::InvalidHeader(format!(
                "non-zero flags: 0x{:04x}",
                flags
            )));
        }

        let column_count = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let row_count = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

        if row_count > MAX_ROWS {
            return Err(CodecError::TooManyRows {
                rows: row_count,
                max: MAX_ROWS,
            });
        }
        if column_count == 0 && row_count > 0 {
            return Err(CodecError::InvalidHeader(format!(
                "{} rows declared without any columns",
                row_count
            )));
        }

        Ok(Self {
            magic,
            version,
            flags,
            column_count,
            row_count,
        })
    }

    /// Bytes each column's validity bitmap occupies for this row count.
    pub fn bitmap_len(&self) -> usize {
        bitmap_len(self.row_count as usize)
    }
}

/// Validity bitmap size for `rows` rows: one bit per row, LSB first.
pub fn bitmap_len(rows: usize) -> usize {
    rows.div_ceil(8)
}

/// Physical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// All cells null; body is only the validity bitmap.
    Null,
    /// Booleans.
    Bool,
    /// Signed 64-bit integers.
    Int64,
    /// 64-bit floats.
    Float64,
    /// UTF-8 strings.
    Utf8,
    /// Arbitrary JSON values (objects, arrays, mixed columns).
    Json,
}

impl ColumnType {
    /// Parses a type tag, returning `None` for tags this version does not know.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TYPE_NULL => Some(ColumnType::Null),
            TYPE_BOOL => Some(ColumnType::Bool),
            TYPE_INT64 => Some(ColumnType::Int64),
            TYPE_FLOAT64 => Some(ColumnType::Float64),
            TYPE_UTF8 => Some(ColumnType::Utf8),
            TYPE_JSON => Some(ColumnType::Json),
            _ => None,
        }
    }

    /// Returns the tag byte for this type.
    pub fn to_byte(self) -> u8 {
        match self {
            ColumnType::Null => TYPE_NULL,
            ColumnType::Bool => TYPE_BOOL,
            ColumnType::Int64 => TYPE_INT64,
            ColumnType::Float64 => TYPE_FLOAT64,
            ColumnType::Utf8 => TYPE_UTF8,
            ColumnType::Json => TYPE_JSON,
        }
    }

    /// Human-readable type name.
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Null => "null",
            ColumnType::Bool => "bool",
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Utf8 => "utf8",
            ColumnType::Json => "json",
        }
    }
}

/// Name and type of one column as declared by a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Column name (becomes the row key).
    pub name: String,
    /// Physical column type.
    pub column_type: ColumnType,
}
