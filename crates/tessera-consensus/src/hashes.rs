use serde::Serialize;
use serde_json::Value;
use tessera_canonical::{canonical_bytes, sha256_hex, HexDigest};

use crate::errors::ConsensusError;

/// Serializes `item` into structural JSON data.
pub(crate) fn to_structural<T: Serialize + ?Sized>(item: &T) -> Result<Value, ConsensusError> {
    serde_json::to_value(item).map_err(|e| ConsensusError::Serialization(e.to_string()))
}

/// SHA-256 of the canonical bytes of one record.
///
/// This is the leaf hash used by [`merkle_root`](crate::merkle_root).
pub fn record_hash<T: Serialize + ?Sized>(item: &T) -> Result<HexDigest, ConsensusError> {
    let value = to_structural(item)?;
    Ok(sha256_hex(&canonical_bytes(&value)?))
}

/// Canonical hash of every item, in input order.
///
/// # Errors
///
/// Fails the whole call if any item cannot be serialized or canonicalized;
/// the error names the offending position.
pub fn batch_hashes<T: Serialize>(items: &[T]) -> Result<Vec<HexDigest>, ConsensusError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            record_hash(item).map_err(|e| match e {
                ConsensusError::Serialization(msg) => {
                    ConsensusError::Serialization(format!("item {}: {}", index, msg))
                }
                other => other,
            })
        })
        .collect()
}
