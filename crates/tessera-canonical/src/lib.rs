//! Canonical serialization primitives for Tessera hashing.
//!
//! Every digest produced by the workspace (Merkle leaves, batch hashes, block
//! header numeric fields) goes through the single canonicalizer in this crate:
//! RFC 8785 key ordering with a fixed numeric formatting profile.
//!
#![deny(missing_docs)]

/// Canonicalization helpers for deterministic hashing.
pub mod canonicalizer;
/// SHA-256 hex digest primitives.
pub mod digest;
/// Hygiene report types emitted during canonicalization.
pub mod hygiene;
/// Validation errors for canonical primitives.
pub mod validation;

pub use canonicalizer::{
    canonical_bytes, canonical_number_text, CanonicalizationError, CanonicalizationResult,
    Canonicalizer,
};
pub use digest::{sha256_hex, HexDigest};
pub use hygiene::{HygieneReport, HygieneStatus, HygieneWarning};
pub use validation::ValidationError;
