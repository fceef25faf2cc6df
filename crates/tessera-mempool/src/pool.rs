use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tessera_consensus::TransactionRecord;

use crate::entry::MempoolEntry;
use crate::errors::MempoolError;

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MempoolStats {
    /// Entries currently held.
    pub size: usize,
    /// Configured maximum entry count.
    pub capacity: usize,
    /// Free slots.
    pub available: usize,
    /// Records admitted since creation.
    pub admitted_total: u64,
    /// Records removed by [`Mempool::drain`] since creation.
    pub drained_total: u64,
}

struct Inner {
    /// Entries in admission order; sequence numbers strictly increase front to back.
    entries: VecDeque<MempoolEntry>,
    next_sequence: u64,
    admitted_total: u64,
    drained_total: u64,
}

/// Bounded, thread-safe pool of admitted records.
///
/// Sequence assignment and insertion happen under one lock, so sequence
/// numbers are unique and reflect admission order across all callers.
///
/// # Example
///
/// ```rust
/// use tessera_consensus::TransactionRecord;
/// use tessera_mempool::Mempool;
/// use serde_json::json;
///
/// let pool = Mempool::new(10)?;
/// let record = TransactionRecord::from_value(
///     json!({"entity_id": "e1", "event": "create", "timestamp": 1700000000}),
/// ).unwrap();
///
/// let seq = pool.admit(record)?;
/// assert_eq!(seq, 1);
/// assert_eq!(pool.size(), 1);
/// # Ok::<(), tessera_mempool::MempoolError>(())
/// ```
pub struct Mempool {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl Mempool {
    /// Creates an empty pool holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, MempoolError> {
        if capacity == 0 {
            return Err(MempoolError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: VecDeque::new(),
                next_sequence: 1,
                admitted_total: 0,
                drained_total: 0,
            }),
        })
    }

    /// Configured maximum entry count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admits one record and returns its sequence number.
    pub fn admit(&self, record: TransactionRecord) -> Result<u64, MempoolError> {
        self.admit_batch(vec![record]).map(|range| range.start)
    }

    /// Admits every record or none of them.
    ///
    /// On success the records hold the contiguous sequence range returned, in
    /// input order. An empty batch admits nothing and returns an empty range.
    ///
    /// # Errors
    ///
    /// Returns [`MempoolError::CapacityExceeded`] if the batch does not fit in
    /// the free slots; the pool is left unchanged.
    pub fn admit_batch(
        &self,
        records: Vec<TransactionRecord>,
    ) -> Result<Range<u64>, MempoolError> {
        let received_at = Utc::now();
        let records: Vec<Arc<TransactionRecord>> = records.into_iter().map(Arc::new).collect();
        let requested = records.len();

        let mut inner = self.inner.lock();
        let available = self.capacity - inner.entries.len();
        if requested > available {
            return Err(MempoolError::CapacityExceeded {
                capacity: self.capacity,
                requested,
                available,
            });
        }

        let start = inner.next_sequence;
        for record in records {
            let sequence = inner.next_sequence;
            inner.next_sequence += 1;
            inner.entries.push_back(MempoolEntry {
                sequence,
                received_at,
                record,
            });
        }
        inner.admitted_total += requested as u64;
        Ok(start..inner.next_sequence)
    }

    /// Copy of every entry, in admission order.
    pub fn snapshot(&self) -> Vec<MempoolEntry> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    /// Number of entries held.
    pub fn size(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if the pool holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Returns true if no further record can be admitted.
    pub fn is_full(&self) -> bool {
        self.inner.lock().entries.len() >= self.capacity
    }

    /// Removes and returns up to `max` of the oldest entries.
    pub fn drain(&self, max: usize) -> Vec<MempoolEntry> {
        let mut inner = self.inner.lock();
        let count = max.min(inner.entries.len());
        let drained: Vec<MempoolEntry> = inner.entries.drain(..count).collect();
        inner.drained_total += drained.len() as u64;
        drained
    }

    /// Returns up to `max` of the oldest entries without removing them.
    pub fn peek(&self, max: usize) -> Vec<MempoolEntry> {
        self.inner.lock().entries.iter().take(max).cloned().collect()
    }

    /// Looks up an entry by sequence number.
    pub fn get(&self, sequence: u64) -> Option<MempoolEntry> {
        let inner = self.inner.lock();
        inner
            .entries
            .binary_search_by_key(&sequence, |e| e.sequence)
            .ok()
            .map(|index| inner.entries[index].clone())
    }

    /// Returns true if an entry with this sequence number is held.
    pub fn contains(&self, sequence: u64) -> bool {
        self.inner
            .lock()
            .entries
            .binary_search_by_key(&sequence, |e| e.sequence)
            .is_ok()
    }

    /// Removes every entry and returns how many were dropped.
    ///
    /// Sequence numbering continues from where it was.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        count
    }

    /// Current counters.
    pub fn stats(&self) -> MempoolStats {
        let inner = self.inner.lock();
        MempoolStats {
            size: inner.entries.len(),
            capacity: self.capacity,
            available: self.capacity - inner.entries.len(),
            admitted_total: inner.admitted_total,
            drained_total: inner.drained_total,
        }
    }
}
