/// Errors reported by a ledger backend.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Keys must be non-empty.
    #[error("ledger key must not be empty")]
    EmptyKey,

    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the journal file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fault reported by a remote or otherwise opaque backend.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
