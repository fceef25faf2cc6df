use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;

use crate::validation::ValidationError;

/// SHA-256 of the empty byte string.
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

fn hex_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{64}$").expect("invalid regex"))
}

/// A 256-bit digest encoded as 64 lowercase hexadecimal characters.
///
/// Used for Merkle roots, block hashes, and per-item hashes. Parsing accepts
/// either case and stores lowercase, so equal digests always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HexDigest(String);

impl HexDigest {
    /// Parses a 64-character hex string, normalizing it to lowercase.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if !hex_pattern().is_match(&s) {
            let len = s.chars().count();
            return Err(ValidationError::InvalidDigest { value: s, len });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Digest of the empty byte string, the sentinel for empty inputs.
    pub fn empty() -> Self {
        Self(EMPTY_SHA256.to_string())
    }

    /// Builds a digest from raw SHA-256 output.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Decodes the digest back into raw bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        hex::decode_to_slice(&self.0, &mut out).expect("HexDigest holds validated hex");
        out
    }

    /// Returns the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HexDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for HexDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        HexDigest::parse(s).map_err(serde::de::Error::custom)
    }
}

/// Raw SHA-256 of `bytes`.
pub(crate) fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// SHA-256 of `bytes` as a [`HexDigest`].
pub fn sha256_hex(bytes: &[u8]) -> HexDigest {
    HexDigest::from_bytes(sha256(bytes))
}
