use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A length-prefixed message could not be read or written.
#[derive(Error, Debug)]
pub enum FramingError {
    /// The stream ended inside a length prefix or payload.
    #[error("connection closed after {received} of {expected} bytes")]
    UnexpectedEof {
        /// Bytes the prefix or payload called for.
        expected: usize,
        /// Bytes actually received.
        received: usize,
    },
    /// The declared length exceeds the configured maximum.
    #[error("message of {size} bytes exceeds maximum {max}")]
    TooLarge {
        /// Declared payload length.
        size: usize,
        /// Configured maximum.
        max: usize,
    },
    /// The payload does not fit in a 4-byte length prefix.
    #[error("message of {0} bytes cannot be length-prefixed")]
    Unrepresentable(usize),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("config (read): '{path}': {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("config (parse): {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("config (invalid): {0}")]
    Invalid(String),
}

/// Ingestion server and client errors.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Framing failure.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),
    /// Batch encoding failure (client side).
    #[error("codec error: {0}")]
    Codec(#[from] tessera_codec::CodecError),
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Mempool construction failure.
    #[error("mempool error: {0}")]
    Mempool(#[from] tessera_mempool::MempoolError),
    /// The server refused the auth token.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),
    /// The peer sent something this protocol does not allow.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// A read or write did not finish in time.
    #[error("{0} timed out")]
    Timeout(&'static str),
    /// The peer closed the connection before replying.
    #[error("connection closed by peer")]
    ConnectionClosed,
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
