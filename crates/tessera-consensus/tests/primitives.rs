use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tessera_canonical::HexDigest;
use tessera_codec::{decode, encode, Row};
use tessera_consensus::{
    batch_hashes, block_hash, bulk_validate, merkle_root, record_hash, validate_each,
    BlockHeader, StructuralValidationError, TransactionRecord,
};

fn three_events() -> Vec<Value> {
    vec![
        json!({"entity_id": "e1", "event": "create", "timestamp": 1700000000}),
        json!({"entity_id": "e2", "event": "update", "timestamp": 1700000001}),
        json!({"entity_id": "e3", "event": "delete", "timestamp": 1700000002}),
    ]
}

fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

#[test]
fn three_event_root_is_reproducible() {
    let events = three_events();
    let first = merkle_root(&events).unwrap();
    let second = merkle_root(&events.clone()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_str().len(), 64);
    assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn three_event_root_matches_manual_tree() {
    let leaves: Vec<[u8; 32]> = [
        r#"{"entity_id":"e1","event":"create","timestamp":1700000000}"#,
        r#"{"entity_id":"e2","event":"update","timestamp":1700000001}"#,
        r#"{"entity_id":"e3","event":"delete","timestamp":1700000002}"#,
    ]
    .iter()
    .map(|text| sha256(text.as_bytes()))
    .collect();

    let pair = |a: &[u8; 32], b: &[u8; 32]| {
        let mut joined = a.to_vec();
        joined.extend_from_slice(b);
        sha256(&joined)
    };
    let root = pair(&pair(&leaves[0], &leaves[1]), &pair(&leaves[2], &leaves[2]));

    assert_eq!(
        merkle_root(&three_events()).unwrap().as_str(),
        hex::encode(root)
    );
}

#[test]
fn empty_root_is_sentinel() {
    let events: Vec<Value> = Vec::new();
    assert_eq!(
        merkle_root(&events).unwrap().as_str(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn single_event_root_is_leaf_hash() {
    let event = three_events().remove(0);
    assert_eq!(
        merkle_root(&[event.clone()]).unwrap(),
        record_hash(&event).unwrap()
    );
}

#[test]
fn root_ignores_key_order() {
    let reordered: Vec<Value> = vec![
        serde_json::from_str(r#"{"timestamp":1700000000,"event":"create","entity_id":"e1"}"#)
            .unwrap(),
        serde_json::from_str(r#"{"timestamp":1700000001,"entity_id":"e2","event":"update"}"#)
            .unwrap(),
        serde_json::from_str(r#"{"event":"delete","entity_id":"e3","timestamp":1700000002}"#)
            .unwrap(),
    ];
    assert_eq!(
        merkle_root(&reordered).unwrap(),
        merkle_root(&three_events()).unwrap()
    );
}

#[test]
fn root_depends_on_order_and_content() {
    let events = three_events();
    let base = merkle_root(&events).unwrap();

    let mut swapped = events.clone();
    swapped.swap(0, 1);
    assert_ne!(merkle_root(&swapped).unwrap(), base);

    let mut edited = events;
    edited[2]["event"] = json!("archive");
    assert_ne!(merkle_root(&edited).unwrap(), base);
}

#[test]
fn root_is_stable_through_codec() {
    let rows: Vec<Row> = three_events()
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
    let decoded = decode(&encode(&rows).unwrap()).unwrap();
    assert_eq!(
        merkle_root(&decoded).unwrap(),
        merkle_root(&three_events()).unwrap()
    );
}

#[test]
fn records_hash_like_their_rows() {
    let events = three_events();
    let records: Vec<TransactionRecord> = events
        .iter()
        .cloned()
        .map(|v| TransactionRecord::from_value(v).unwrap())
        .collect();
    assert_eq!(batch_hashes(&records).unwrap(), batch_hashes(&events).unwrap());
}

#[test]
fn ten_rows_missing_timestamp_on_row_seven() {
    let records: Vec<Value> = (0..10)
        .map(|i| {
            if i == 7 {
                json!({"entity_id": format!("e{}", i), "event": "create"})
            } else {
                json!({"entity_id": format!("e{}", i), "event": "create", "timestamp": 1700000000 + i})
            }
        })
        .collect();

    assert!(!bulk_validate(&records));

    let report = validate_each(&records);
    for (i, result) in report.iter().enumerate() {
        if i == 7 {
            assert_eq!(
                result,
                &Err(StructuralValidationError::MissingField { field: "timestamp" })
            );
        } else {
            assert!(result.is_ok(), "row {} rejected", i);
        }
    }
}

#[test]
fn bulk_validate_fails_regardless_of_position() {
    let good = json!({"entity_id": "e", "event": "x", "timestamp": 1});
    let bad = json!({"entity_id": "e", "timestamp": 1});
    for position in 0..3 {
        let mut records = vec![good.clone(); 3];
        records[position] = bad.clone();
        assert!(!bulk_validate(&records), "bad row at {} passed", position);
    }
    assert!(bulk_validate(&vec![good; 3]));
}

#[test]
fn block_hash_changes_with_every_field() {
    let base = BlockHeader::new(
        1,
        1700000000u64,
        HexDigest::parse("a".repeat(64)).unwrap(),
        HexDigest::parse("b".repeat(64)).unwrap(),
        23,
    );
    let base_hash = block_hash(&base).unwrap();

    let mut variants = Vec::new();
    let mut h = base.clone();
    h.index = 2;
    variants.push(h);
    let mut h = base.clone();
    h.timestamp = 1700000001u64.into();
    variants.push(h);
    let mut h = base.clone();
    h.previous_hash = HexDigest::parse("c".repeat(64)).unwrap();
    variants.push(h);
    let mut h = base.clone();
    h.merkle_root = HexDigest::parse("d".repeat(64)).unwrap();
    variants.push(h);
    let mut h = base.clone();
    h.nonce = 24;
    variants.push(h);

    for variant in variants {
        assert_ne!(block_hash(&variant).unwrap(), base_hash, "{:?}", variant);
    }
}

#[test]
fn block_hash_index_nonce_boundary() {
    let prev = HexDigest::parse("a".repeat(64)).unwrap();
    let root = HexDigest::parse("b".repeat(64)).unwrap();
    let a = BlockHeader::new(1, 1700000000u64, prev.clone(), root.clone(), 23);
    let b = BlockHeader::new(12, 1700000000u64, prev, root, 3);
    assert_ne!(block_hash(&a).unwrap(), block_hash(&b).unwrap());
}

#[test]
fn primitives_run_concurrently() {
    let events = three_events();
    let expected = merkle_root(&events).unwrap();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let events = events.clone();
            std::thread::spawn(move || merkle_root(&events).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
