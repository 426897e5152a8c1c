/// Transaction ids live above this bound; commit ids below it. A version
/// tagged with a value under the bound is committed.
pub const TRANSACTION_ID_START: u64 = 1 << 62;

/// Identity and snapshot of the transaction driving an operation, supplied
/// by the transaction manager. This engine only reads it to pick the
/// visible version of an updated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionData {
    pub transaction_id: u64,
    pub start_time: u64,
}

impl TransactionData {
    pub fn new(transaction_id: u64, start_time: u64) -> Self {
        Self {
            transaction_id,
            start_time,
        }
    }

    /// A version is visible when this transaction wrote it, or when it was
    /// committed at or before this transaction's snapshot.
    #[inline]
    pub fn can_see(&self, version_id: u64) -> bool {
        version_id == self.transaction_id
            || (version_id < TRANSACTION_ID_START && version_id <= self.start_time)
    }
}
