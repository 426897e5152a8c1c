use thiserror::Error;

/// Errors raised by the column storage engine.
///
/// `Internal` marks invariant violations: a bug in this crate or in a
/// collaborator, never recoverable by retrying. `TransactionConflict` is the
/// one user-visible recoverable failure; callers abort or retry the
/// enclosing operation. `Corrupt` means persisted state failed validation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("Corrupt storage: {0}")]
    Corrupt(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Unknown compression method: {0}")]
    UnknownCompression(String),
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Block write failed: {0}")]
    BlockWrite(String),

    #[error("Segment scan failed: {0}")]
    SegmentScan(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
