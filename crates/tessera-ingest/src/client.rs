use tessera_codec::{encode, Row};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::config::DEFAULT_MAX_MESSAGE_SIZE;
use crate::errors::IngestError;
use crate::framing::{read_frame, write_frame};
use crate::protocol::{Ack, AuthRequest, AuthResponse};

/// Async client for the ingestion protocol.
///
/// # Example
///
/// ```no_run
/// use tessera_ingest::{Ack, IngestClient};
/// use serde_json::json;
///
/// # async fn submit() -> Result<(), tessera_ingest::IngestError> {
/// let mut client = IngestClient::connect("127.0.0.1:9400").await?;
/// let row = json!({"entity_id": "e1", "event": "create", "timestamp": 1700000000});
/// let ack = client.submit_rows(&[row.as_object().cloned().unwrap()]).await?;
/// assert_eq!(ack, Ack::Ok);
/// # Ok(())
/// # }
/// ```
pub struct IngestClient {
    stream: TcpStream,
    max_response_size: usize,
}

impl IngestClient {
    /// Connects to a server.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, IngestError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            max_response_size: DEFAULT_MAX_MESSAGE_SIZE,
        })
    }

    /// Performs the token handshake. Must precede any batch on servers that
    /// require authentication.
    pub async fn authenticate(&mut self, token: &str) -> Result<(), IngestError> {
        let request = serde_json::to_vec(&AuthRequest::new(token))
            .map_err(|e| IngestError::Protocol(e.to_string()))?;
        let reply = self.exchange(&request).await?;
        let response: AuthResponse = serde_json::from_slice(&reply)
            .map_err(|e| IngestError::Protocol(format!("unreadable auth reply: {}", e)))?;
        if response.success {
            Ok(())
        } else {
            Err(IngestError::AuthRejected(
                response.error.unwrap_or_else(|| "no reason given".to_string()),
            ))
        }
    }

    /// Encodes `rows` as one batch and submits it.
    pub async fn submit_rows(&mut self, rows: &[Row]) -> Result<Ack, IngestError> {
        let payload = encode(rows)?;
        self.submit_raw(&payload).await
    }

    /// Submits an already-encoded payload.
    pub async fn submit_raw(&mut self, payload: &[u8]) -> Result<Ack, IngestError> {
        let reply = self.exchange(payload).await?;
        let ack = Ack::from_payload(&reply)?;
        if let Ack::Rejected(reason) = &ack {
            tracing::debug!(kind = ?reason.error, message = %reason.message, "batch rejected");
        }
        Ok(ack)
    }

    async fn exchange(&mut self, payload: &[u8]) -> Result<Vec<u8>, IngestError> {
        write_frame(&mut self.stream, payload).await?;
        read_frame(&mut self.stream, self.max_response_size)
            .await?
            .ok_or(IngestError::ConnectionClosed)
    }
}
