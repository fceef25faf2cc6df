use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tessera_mempool::Mempool;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::auth::Authenticator;
use crate::config::IngestConfig;
use crate::errors::{FramingError, IngestError};
use crate::framing::{read_frame, read_length, read_payload, write_frame};
use crate::handler::BatchHandler;
use crate::metrics::IngestMetrics;
use crate::protocol::{Ack, ErrorKind, ErrorPayload};

/// Time allowed for the client's auth frame.
const AUTH_READ_TIMEOUT: Duration = Duration::from_secs(10);
/// Time allowed for the auth reply.
const AUTH_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
/// Largest accepted auth frame.
const AUTH_MAX_FRAME: usize = 4096;
/// Pause after a failed accept before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Length-prefixed batch ingestion server.
///
/// One task serves each connection. Connections share only the mempool.
pub struct IngestServer {
    listener: TcpListener,
    config: Arc<IngestConfig>,
    handler: BatchHandler,
    auth: Authenticator,
}

impl IngestServer {
    /// Validates `config` and binds the listening socket.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] for an invalid config and
    /// [`IngestError::Bind`] if the address cannot be bound.
    pub async fn bind(config: IngestConfig, mempool: Arc<Mempool>) -> Result<Self, IngestError> {
        config.validate()?;
        let listener = TcpListener::bind(&config.listen)
            .await
            .map_err(|source| IngestError::Bind {
                addr: config.listen.clone(),
                source,
            })?;
        tracing::info!(
            addr = %listener.local_addr()?,
            max_message_size = config.max_message_size,
            capacity = mempool.capacity(),
            auth = config.auth_token.is_some(),
            "ingest server listening"
        );

        let auth = Authenticator::new(config.auth_token.clone());
        Ok(Self {
            listener,
            config: Arc::new(config),
            handler: BatchHandler::new(mempool),
            auth,
        })
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The mempool batches are admitted into.
    pub fn mempool(&self) -> &Arc<Mempool> {
        self.handler.mempool()
    }

    /// Counters updated by every connection.
    pub fn metrics(&self) -> &Arc<IngestMetrics> {
        self.handler.metrics()
    }

    /// Accepts connections until `shutdown` is cancelled, then waits for every
    /// connection task to finish.
    ///
    /// A connection notices shutdown only while waiting for its next length
    /// prefix, so a batch already being received is still processed and
    /// answered.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), IngestError> {
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::info!(peer = %peer, "client connected");
                        let connection = Connection {
                            stream,
                            peer,
                            config: Arc::clone(&self.config),
                            handler: self.handler.clone(),
                            auth: self.auth.clone(),
                        };
                        tracker.spawn(connection.run(shutdown.clone()));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        }

        drop(self.listener);
        tracker.close();
        tracing::info!(connections = tracker.len(), "draining connections");
        tracker.wait().await;
        let metrics = self.handler.metrics_snapshot();
        tracing::info!(
            pooled = metrics.mempool_size,
            batches = metrics.batches_total,
            accepted = metrics.batches_accepted,
            "ingest server stopped"
        );
        Ok(())
    }
}

/// Per-connection state: `AWAIT_LENGTH → AWAIT_PAYLOAD → DECODE →
/// VALIDATE_ADMIT → ACK`, repeated until the peer leaves.
struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    config: Arc<IngestConfig>,
    handler: BatchHandler,
    auth: Authenticator,
}

impl Connection {
    async fn run(mut self, shutdown: CancellationToken) {
        match self.serve(shutdown).await {
            Ok(()) => tracing::info!(peer = %self.peer, "client disconnected"),
            Err(e) => tracing::warn!(peer = %self.peer, error = %e, "connection closed"),
        }
    }

    async fn serve(&mut self, shutdown: CancellationToken) -> Result<(), IngestError> {
        if self.auth.is_enabled() && !self.authenticate().await? {
            return Ok(());
        }

        let max = self.config.max_message_size;
        let read_timeout = self.config.read_timeout();

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::debug!(peer = %self.peer, "shutdown while idle");
                    return Ok(());
                }
                read = timeout(read_timeout, read_length(&mut self.stream)) => {
                    read.map_err(|_| IngestError::Timeout("read"))??
                }
            };
            let Some(len) = next else {
                return Ok(());
            };

            if len > max {
                let err = FramingError::TooLarge { size: len, max };
                self.handler.metrics().record_rejection(ErrorKind::Framing);
                let reply = Ack::Rejected(ErrorPayload::new(ErrorKind::Framing, err.to_string()));
                self.send(&reply.to_payload()).await?;
                return Err(err.into());
            }

            let payload = timeout(read_timeout, read_payload(&mut self.stream, len, max))
                .await
                .map_err(|_| IngestError::Timeout("read"))??;

            let handler = self.handler.clone();
            let ack = tokio::task::spawn_blocking(move || handler.handle(&payload))
                .await
                .map_err(|e| IngestError::Io(io::Error::other(e)))?;

            match &ack {
                Ack::Ok => tracing::debug!(peer = %self.peer, bytes = len, "batch acknowledged"),
                Ack::Rejected(reply) => tracing::info!(
                    peer = %self.peer,
                    kind = ?reply.error,
                    message = %reply.message,
                    "batch rejected"
                ),
            }
            self.send(&ack.to_payload()).await?;
        }
    }

    /// Runs the handshake; returns false if the client must be dropped.
    async fn authenticate(&mut self) -> Result<bool, IngestError> {
        let frame = match timeout(AUTH_READ_TIMEOUT, read_frame(&mut self.stream, AUTH_MAX_FRAME))
            .await
            .map_err(|_| IngestError::Timeout("auth read"))?
        {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(false),
            Err(FramingError::TooLarge { size, .. }) => {
                self.handler.metrics().record_rejection(ErrorKind::Auth);
                let reply = Ack::Rejected(ErrorPayload::new(
                    ErrorKind::Auth,
                    format!("expected auth frame, got {} bytes", size),
                ));
                self.send(&reply.to_payload()).await?;
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let reply = self.auth.handshake(&frame);
        if !reply.success {
            self.handler.metrics().record_rejection(ErrorKind::Auth);
        }
        let bytes = serde_json::to_vec(&reply).map_err(|e| IngestError::Protocol(e.to_string()))?;
        timeout(AUTH_WRITE_TIMEOUT, write_frame(&mut self.stream, &bytes))
            .await
            .map_err(|_| IngestError::Timeout("auth write"))??;

        if reply.success {
            tracing::debug!(peer = %self.peer, "client authenticated");
        } else {
            tracing::warn!(peer = %self.peer, "authentication failed");
        }
        Ok(reply.success)
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), IngestError> {
        timeout(self.config.write_timeout(), write_frame(&mut self.stream, payload))
            .await
            .map_err(|_| IngestError::Timeout("write"))??;
        Ok(())
    }
}
