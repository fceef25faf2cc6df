use thiserror::Error;

/// Mempool error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MempoolError {
    /// The admission does not fit in the remaining capacity.
    #[error("mempool capacity exceeded: {requested} requested, {available} of {capacity} available")]
    CapacityExceeded {
        /// Configured maximum entry count.
        capacity: usize,
        /// Entries the admission needed.
        requested: usize,
        /// Free slots at the time of the attempt.
        available: usize,
    },
    /// A pool was configured with zero capacity.
    #[error("mempool capacity must be at least 1")]
    ZeroCapacity,
}
