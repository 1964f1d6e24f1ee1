use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies a transaction. Allocated by the transaction layer; the storage
/// layer only threads it through to the buffer pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocates a new, process-unique transaction id.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        TransactionId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

/// The access mode requested when fetching a page from the buffer pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Permissions {
    ReadOnly,
    ReadWrite,
}
