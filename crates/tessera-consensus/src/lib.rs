//! Consensus primitives for Tessera.
//!
//! This crate provides:
//! - Structural validation of transaction rows (`bulk_validate`, `validate_each`)
//! - Merkle roots over canonicalized records
//! - Domain-separated block header hashing
//! - Per-item canonical hashes (`batch_hashes`)
//! - A C ABI over the same functions (`ffi`)
//!
//! Core invariants:
//! - Every primitive is a pure function of its input
//! - Hash input is always the canonical byte form of a record, so key order
//!   and integral-float spelling never change a digest
//! - Empty input to `merkle_root` yields the SHA-256 of the empty string
//!
#![deny(missing_docs)]

/// Block header type and hashing.
pub mod block;
/// Error types for consensus operations.
pub mod errors;
/// C ABI over the consensus primitives.
pub mod ffi;
/// Per-item canonical hashing.
pub mod hashes;
/// Merkle tree construction.
pub mod merkle;
/// Validated transaction record.
pub mod record;
/// Structural validation of rows.
pub mod validation;

pub use block::{block_hash, block_hash_value, BlockHeader};
pub use errors::{ConsensusError, StructuralValidationError};
pub use hashes::{batch_hashes, record_hash};
pub use merkle::{merkle_root, merkle_root_from_leaves};
pub use record::TransactionRecord;
pub use validation::{
    bulk_validate, bulk_validate_serialized, check_record, validate_each, AsRecord,
    REQUIRED_FIELDS,
};
