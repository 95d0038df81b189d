use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("{field} must be a non-empty string")]
    EmptyComponent { field: &'static str },

    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("invalid transaction id: {0}")]
    InvalidTxId(String),
}
