use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use serde_json::json;
use tessera_consensus::TransactionRecord;
use tessera_mempool::{Mempool, MempoolError};

fn record(thread: usize, n: usize) -> TransactionRecord {
    TransactionRecord::from_value(json!({
        "entity_id": format!("t{}-{}", thread, n),
        "event": "create",
        "timestamp": 1700000000,
    }))
    .unwrap()
}

#[test]
fn concurrent_admissions_get_unique_monotonic_sequences() {
    let pool = Arc::new(Mempool::new(10_000).unwrap());
    let threads = 8;
    let per_thread = 250;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let mut seqs = Vec::with_capacity(per_thread);
                for n in 0..per_thread {
                    seqs.push(pool.admit(record(t, n)).unwrap());
                }
                seqs
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        let seqs = handle.join().unwrap();
        // each thread observes its own admissions in increasing order
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
        all.extend(seqs);
    }

    assert_eq!(all.len(), threads * per_thread);
    assert_eq!(pool.size(), threads * per_thread);

    let snapshot = pool.snapshot();
    assert!(snapshot.windows(2).all(|w| w[0].sequence < w[1].sequence));
    assert_eq!(snapshot.first().unwrap().sequence, 1);
    assert_eq!(
        snapshot.last().unwrap().sequence,
        (threads * per_thread) as u64
    );
}

#[test]
fn concurrent_batches_stay_contiguous() {
    let pool = Arc::new(Mempool::new(10_000).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let batch: Vec<_> = (0..50).map(|n| record(t, n)).collect();
                (t, pool.admit_batch(batch).unwrap())
            })
        })
        .collect();

    for handle in handles {
        let (t, range) = handle.join().unwrap();
        assert_eq!(range.end - range.start, 50);
        for seq in range {
            let entry = pool.get(seq).unwrap();
            assert!(entry
                .record
                .entity_id()
                .unwrap()
                .starts_with(&format!("t{}-", t)));
        }
    }
}

#[test]
fn capacity_is_never_exceeded_under_contention() {
    let pool = Arc::new(Mempool::new(100).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let mut admitted = 0usize;
                for n in 0..50 {
                    match pool.admit(record(t, n)) {
                        Ok(_) => admitted += 1,
                        Err(MempoolError::CapacityExceeded { .. }) => {}
                        Err(other) => panic!("unexpected error: {}", other),
                    }
                }
                admitted
            })
        })
        .collect();

    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(admitted, 100);
    assert_eq!(pool.size(), 100);
    assert!(pool.is_full());
}
