//! Columnar batch format for Tessera transaction rows.
//!
//! This crate provides:
//! - The `TCB1` self-describing columnar layout (header, column schema, column bodies)
//! - A decoder that turns a batch into schema-tolerant rows
//! - An encoder that infers one column type per column from row values
//!
//! ## Quick Start
//!
//! ```rust
//! use tessera_codec::{decode, encode, Row};
//! use serde_json::json;
//!
//! let row: Row = json!({"entity_id": "e1", "event": "create", "timestamp": 1700000000})
//!     .as_object()
//!     .cloned()
//!     .unwrap();
//!
//! let bytes = encode(&[row.clone()])?;
//! let rows = decode(&bytes)?;
//! assert_eq!(rows, vec![row]);
//! # Ok::<(), tessera_codec::CodecError>(())
//! ```
//!
//! Decoding never requires a fixed schema: every column present in the batch
//! appears as a key in each decoded row, and null cells decode to JSON `null`.

#![deny(missing_docs)]

/// Header, column schema and type tags.
pub mod batch;
/// Error types for codec operations.
pub mod errors;
/// Batch decoder.
pub mod reader;
/// Row type alias and helpers.
pub mod row;
/// Batch encoder.
pub mod writer;

pub use batch::{BatchHeader, ColumnSchema, ColumnType};
pub use errors::CodecError;
pub use reader::{decode, decode_batch, BatchReader, DecodedBatch};
pub use row::{row_from_value, Row};
pub use writer::{encode, BatchWriter};
