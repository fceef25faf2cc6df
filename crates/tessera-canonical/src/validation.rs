use thiserror::Error;

/// Errors for malformed canonical primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A digest string is not 64 hexadecimal characters.
    #[error("expected 64 hex characters, got '{value}' ({len} chars)")]
    InvalidDigest {
        /// Offending value.
        value: String,
        /// Its length in characters.
        len: usize,
    },
}
