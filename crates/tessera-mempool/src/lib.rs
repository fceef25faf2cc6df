//! In-memory mempool for Tessera.
//!
//! Admitted records receive a per-pool sequence number (monotonic, starting
//! at 1) and an arrival time. The pool is bounded: once full, admissions are
//! rejected rather than evicting older entries.
//!
//! The pool is `Sync`; share it behind an `Arc`. Every operation takes one
//! short lock, so callers should decode and validate before admitting.
//!
#![deny(missing_docs)]

/// Mempool entry type.
pub mod entry;
/// Error types for mempool operations.
pub mod errors;
/// The pool itself.
pub mod pool;

pub use entry::MempoolEntry;
pub use errors::MempoolError;
pub use pool::{Mempool, MempoolStats, DEFAULT_CAPACITY};
