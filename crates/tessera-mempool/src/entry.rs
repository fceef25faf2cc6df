use std::sync::Arc;

use chrono::{DateTime, Utc};
use tessera_consensus::TransactionRecord;

/// A record held by the mempool.
///
/// Cloning is cheap: the record itself is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct MempoolEntry {
    /// Admission sequence number, unique within the pool.
    pub sequence: u64,
    /// Wall-clock arrival time.
    pub received_at: DateTime<Utc>,
    /// The admitted record.
    pub record: Arc<TransactionRecord>,
}
