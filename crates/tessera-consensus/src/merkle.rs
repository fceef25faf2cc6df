use serde::Serialize;
use sha2::{Digest, Sha256};
use tessera_canonical::HexDigest;

use crate::errors::ConsensusError;
use crate::hashes::record_hash;

/// Computes the Merkle root of an ordered set of records.
///
/// Leaves are `sha256(canonical_bytes(record))`; interior nodes are
/// `sha256(left || right)` over the raw 32-byte digests. When a level has an
/// odd number of nodes the last one is paired with itself.
///
/// Empty input yields [`HexDigest::empty`]; a single record yields its leaf hash.
///
/// # Example
///
/// ```rust
/// use tessera_consensus::merkle_root;
/// use serde_json::json;
///
/// let events = vec![
///     json!({"entity_id": "e1", "event": "create", "timestamp": 1700000000}),
///     json!({"entity_id": "e2", "event": "update", "timestamp": 1700000001}),
/// ];
/// let root = merkle_root(&events)?;
/// assert_eq!(root.as_str().len(), 64);
/// # Ok::<(), tessera_consensus::ConsensusError>(())
/// ```
pub fn merkle_root<T: Serialize>(events: &[T]) -> Result<HexDigest, ConsensusError> {
    let leaves = events
        .iter()
        .map(|event| record_hash(event).map(|digest| digest.to_bytes()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(merkle_root_from_leaves(&leaves))
}

/// Folds precomputed leaf digests into a root.
pub fn merkle_root_from_leaves(leaves: &[[u8; 32]]) -> HexDigest {
    if leaves.is_empty() {
        return HexDigest::empty();
    }

    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                hash_pair(left, right)
            })
            .collect();
    }
    HexDigest::from_bytes(level[0])
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> [u8; 32] {
        [byte; 32]
    }

    #[test]
    fn empty_is_sentinel() {
        assert_eq!(merkle_root_from_leaves(&[]), HexDigest::empty());
    }

    #[test]
    fn single_leaf_is_root() {
        assert_eq!(
            merkle_root_from_leaves(&[leaf(7)]),
            HexDigest::from_bytes(leaf(7))
        );
    }

    #[test]
    fn odd_level_duplicates_last_node() {
        let a = leaf(1);
        let b = leaf(2);
        let c = leaf(3);
        let expected = hash_pair(&hash_pair(&a, &b), &hash_pair(&c, &c));
        assert_eq!(
            merkle_root_from_leaves(&[a, b, c]),
            HexDigest::from_bytes(expected)
        );
    }

    #[test]
    fn duplication_applies_at_every_level() {
        let l: Vec<[u8; 32]> = (1..=5).map(leaf).collect();
        let n01 = hash_pair(&l[0], &l[1]);
        let n23 = hash_pair(&l[2], &l[3]);
        let n44 = hash_pair(&l[4], &l[4]);
        let m0 = hash_pair(&n01, &n23);
        let m1 = hash_pair(&n44, &n44);
        assert_eq!(
            merkle_root_from_leaves(&l),
            HexDigest::from_bytes(hash_pair(&m0, &m1))
        );
    }

    #[test]
    fn order_matters() {
        assert_ne!(
            merkle_root_from_leaves(&[leaf(1), leaf(2)]),
            merkle_root_from_leaves(&[leaf(2), leaf(1)])
        );
    }
}
