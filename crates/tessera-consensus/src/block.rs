use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};
use tessera_canonical::{canonical_number_text, HexDigest};

use crate::errors::ConsensusError;

/// Domain separator for block hashing: `b"tessera:block:v1\0"`.
const BLOCK_DOMAIN_SEPARATOR: &[u8] = b"tessera:block:v1\0";

/// Header fields that feed a block hash.
///
/// Numeric fields accept JSON numbers or numeric strings, so `"1"` and `1`
/// describe the same header. Digest fields accept either hex case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Height of the block.
    #[serde(deserialize_with = "u64_or_string")]
    pub index: u64,
    /// Unix timestamp (seconds or milliseconds).
    #[serde(deserialize_with = "number_or_string")]
    pub timestamp: Number,
    /// Hash of the previous block.
    pub previous_hash: HexDigest,
    /// Merkle root of the block's records.
    pub merkle_root: HexDigest,
    /// Proof-of-work nonce.
    #[serde(deserialize_with = "u64_or_string")]
    pub nonce: u64,
}

impl BlockHeader {
    /// Creates a header.
    pub fn new(
        index: u64,
        timestamp: impl Into<Number>,
        previous_hash: HexDigest,
        merkle_root: HexDigest,
        nonce: u64,
    ) -> Self {
        Self {
            index,
            timestamp: timestamp.into(),
            previous_hash,
            merkle_root,
            nonce,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(Number),
    String(String),
}

fn number_or_string<'de, D>(deserializer: D) -> Result<Number, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .parse::<Number>()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {:?}", s))),
    }
}

/// 2^64, the first float past the u64 range.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

fn u64_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = number_or_string(deserializer)?;
    if let Some(n) = number.as_u64() {
        return Ok(n);
    }
    // 12.0 arrives as a float but names an integer. `u64::MAX as f64` rounds
    // up to 2^64, so the bound must be exclusive.
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f < U64_LIMIT => Ok(f as u64),
        _ => Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {}",
            number
        ))),
    }
}

/// Computes the block hash of a header.
///
/// Formula: `sha256(domain_separator || field(index) || field(timestamp) ||
/// field(previous_hash) || field(merkle_root) || field(nonce))`, where
/// `field(x)` is the u32 big-endian length of the canonical text of `x`
/// followed by that text. The length prefixes keep adjacent fields from
/// running together.
///
/// # Example
///
/// ```rust
/// use tessera_canonical::HexDigest;
/// use tessera_consensus::{block_hash, BlockHeader};
///
/// let header = BlockHeader::new(1, 1700000000, HexDigest::empty(), HexDigest::empty(), 23);
/// let hash = block_hash(&header)?;
/// assert_eq!(hash.as_str().len(), 64);
/// # Ok::<(), tessera_consensus::ConsensusError>(())
/// ```
pub fn block_hash(header: &BlockHeader) -> Result<HexDigest, ConsensusError> {
    let timestamp = canonical_number_text(&header.timestamp)?;
    let fields = [
        header.index.to_string(),
        timestamp,
        header.previous_hash.as_str().to_string(),
        header.merkle_root.as_str().to_string(),
        header.nonce.to_string(),
    ];

    let mut hasher = Sha256::new();
    hasher.update(BLOCK_DOMAIN_SEPARATOR);
    for field in &fields {
        hasher.update((field.len() as u32).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    Ok(HexDigest::from_bytes(hasher.finalize().into()))
}

/// Parses a header from structural data, then hashes it.
///
/// # Errors
///
/// Returns [`ConsensusError::InvalidHeader`] if a field is missing or malformed.
pub fn block_hash_value(value: &Value) -> Result<HexDigest, ConsensusError> {
    let header =
        BlockHeader::deserialize(value).map_err(|e| ConsensusError::InvalidHeader(e.to_string()))?;
    block_hash(&header)
}
