use serde::{Deserialize, Serialize};

use crate::errors::IngestError;

/// Payload of a successful acknowledgment.
pub const ACK_OK: &[u8] = b"OK";

/// Category of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The payload is not a readable batch.
    Codec,
    /// One or more rows lack required fields.
    Validation,
    /// The mempool cannot hold the batch.
    Capacity,
    /// The message framing is unacceptable.
    Framing,
    /// Authentication is required or failed.
    Auth,
}

/// A row-level failure inside a rejected batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Zero-based row index within the batch.
    pub row: usize,
    /// Offending field, when the failure concerns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Human-readable reason.
    pub reason: String,
}

/// JSON diagnostic sent when a batch is not admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Failure category.
    pub error: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Per-row failures, for validation errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<RowError>,
}

impl ErrorPayload {
    /// Creates a payload without row detail.
    pub fn new(error: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            rows: Vec::new(),
        }
    }
}

/// The server's answer to one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// Every row was admitted.
    Ok,
    /// Nothing was admitted.
    Rejected(ErrorPayload),
}

impl Ack {
    /// Returns true for [`Ack::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Ack::Ok)
    }

    /// Wire bytes of this acknowledgment (without the length prefix).
    pub fn to_payload(&self) -> Vec<u8> {
        match self {
            Ack::Ok => ACK_OK.to_vec(),
            Ack::Rejected(payload) => serde_json::to_vec(payload).unwrap_or_else(|_| {
                format!(r#"{{"error":"codec","message":{:?}}}"#, payload.message).into_bytes()
            }),
        }
    }

    /// Parses a response payload.
    pub fn from_payload(bytes: &[u8]) -> Result<Self, IngestError> {
        if bytes == ACK_OK {
            return Ok(Ack::Ok);
        }
        serde_json::from_slice(bytes)
            .map(Ack::Rejected)
            .map_err(|e| IngestError::Protocol(format!("unreadable response: {}", e)))
    }
}

/// First frame of an authenticated connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    /// Must be `"auth"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Shared token.
    pub token: String,
}

impl AuthRequest {
    /// Creates an auth request for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            kind: "auth".to_string(),
            token: token.into(),
        }
    }
}

/// Server reply to an [`AuthRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Whether the token was accepted.
    pub success: bool,
    /// Reason for refusal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
