use subtle::ConstantTimeEq;

use crate::protocol::{AuthRequest, AuthResponse};

/// Checks connection handshakes against a shared token.
#[derive(Clone)]
pub struct Authenticator {
    token: Option<String>,
}

impl Authenticator {
    /// Creates an authenticator; `None` disables authentication.
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Returns true if connections must authenticate.
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Compares `candidate` with the configured token in constant time.
    ///
    /// Always true when authentication is disabled.
    pub fn verify_token(&self, candidate: &str) -> bool {
        match &self.token {
            None => true,
            Some(expected) => bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())),
        }
    }

    /// Checks a handshake frame and builds the reply.
    pub fn handshake(&self, frame: &[u8]) -> AuthResponse {
        let request: AuthRequest = match serde_json::from_slice(frame) {
            Ok(request) => request,
            Err(_) => return refuse("authentication required"),
        };
        if request.kind != "auth" {
            return refuse("authentication required");
        }
        if request.token.is_empty() {
            return refuse("authentication required");
        }
        if !self.verify_token(&request.token) {
            return refuse("authentication failed");
        }
        AuthResponse {
            success: true,
            error: None,
        }
    }
}

// Debug must never print the token.
impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

fn refuse(reason: &str) -> AuthResponse {
    AuthResponse {
        success: false,
        error: Some(reason.to_string()),
    }
}
