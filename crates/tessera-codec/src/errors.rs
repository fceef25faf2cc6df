use thiserror::Error;

/// Errors that can occur while decoding or encoding a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The payload contained no bytes at all.
    #[error("empty batch payload")]
    Empty,
    /// Invalid batch header (magic, flags, or counts).
    #[error("invalid batch header: {0}")]
    InvalidHeader(String),
    /// The batch was written by an unsupported format version.
    #[error("unsupported batch version: 0x{0:04x}")]
    UnsupportedVersion(u16),
    /// A declared length runs past the end of the payload.
    #[error("truncated batch at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        /// Byte offset where the read started.
        offset: usize,
        /// Bytes the structure declared.
        needed: usize,
        /// Bytes actually left in the payload.
        available: usize,
    },
    /// A column body is malformed.
    #[error("invalid column '{column}': {reason}")]
    InvalidColumn {
        /// Column name.
        column: String,
        /// Reason for invalidity.
        reason: String,
    },
    /// A column uses a type tag this version does not understand.
    #[error("column '{column}' has unsupported type tag 0x{tag:02x}")]
    UnsupportedColumnType {
        /// Column name.
        column: String,
        /// Offending tag byte.
        tag: u8,
    },
    /// Two columns share the same name.
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    /// Bytes remain after the last declared column.
    #[error("{remaining} trailing bytes after last column at offset {offset}")]
    TrailingBytes {
        /// Offset of the first unexpected byte.
        offset: usize,
        /// Number of unexpected bytes.
        remaining: usize,
    },
    /// The batch declares more rows than a single batch may carry.
    #[error("batch declares {rows} rows (max: {max})")]
    TooManyRows {
        /// Declared row count.
        rows: u32,
        /// Maximum allowed row count.
        max: u32,
    },
    /// A value cannot be represented in the batch format.
    #[error("cannot encode batch: {0}")]
    Encode(String),
}
