//! TCP ingestion for Tessera.
//!
//! Every message on the wire is a 4-byte big-endian length followed by that
//! many payload bytes. Requests carry one `TCB1` batch; the server answers
//! each with either the two bytes `OK` (every row admitted) or a JSON
//! [`ErrorPayload`] (nothing admitted).
//!
//! ```no_run
//! use std::sync::Arc;
//! use tessera_ingest::{IngestConfig, IngestServer};
//! use tessera_mempool::Mempool;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IngestConfig::default();
//! let mempool = Arc::new(Mempool::new(config.mempool_capacity)?);
//! let server = IngestServer::bind(config, mempool).await?;
//! server.run(CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

/// Shared-token authentication.
pub mod auth;
/// Async client.
pub mod client;
/// Server configuration.
pub mod config;
/// Error types for ingestion.
pub mod errors;
/// Length-prefixed framing over async streams.
pub mod framing;
/// Batch handling: decode, validate, admit.
pub mod handler;
/// Ingestion counters and Prometheus text export.
pub mod metrics;
/// Acknowledgment and diagnostic payloads.
pub mod protocol;
/// Accept loop and per-connection state machine.
pub mod server;

pub use auth::Authenticator;
pub use client::IngestClient;
pub use config::IngestConfig;
pub use errors::{ConfigError, FramingError, IngestError};
pub use handler::BatchHandler;
pub use metrics::{IngestMetrics, MetricsSnapshot};
pub use protocol::{Ack, AuthRequest, AuthResponse, ErrorKind, ErrorPayload, RowError, ACK_OK};
pub use server::IngestServer;
