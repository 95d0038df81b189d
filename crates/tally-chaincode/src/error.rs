use std::fmt;

use serde::{Deserialize, Serialize};
use tally_ledger::LedgerError;

/// 1-based position of an invocation argument, rendered as `1st`, `2nd`, ...
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgPosition(pub usize);

impl fmt::Display for ArgPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        let suffix = match (n % 10, n % 100) {
            (_, 11..=13) => "th",
            (1, _) => "st",
            (2, _) => "nd",
            (3, _) => "rd",
            _ => "th",
        };
        write!(f, "{n}{suffix}")
    }
}

/// Caller-visible failure classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    AlreadyExists,
    NotFound,
    CorruptState,
    StorageError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidInput => "InvalidInput",
            Self::AlreadyExists => "AlreadyExists",
            Self::NotFound => "NotFound",
            Self::CorruptState => "CorruptState",
            Self::StorageError => "StorageError",
        };
        f.write_str(name)
    }
}

/// Errors produced by chaincode operations. All are terminal for the
/// invocation that raised them.
#[derive(Debug, thiserror::Error)]
pub enum ChaincodeError {
    #[error("Received unknown function invocation")]
    UnknownFunction { function: String },

    #[error("Incorrect number of arguments. Expecting {expected}")]
    IncorrectArgumentCount { expected: usize, actual: usize },

    #[error("{position} argument must be a non-empty string")]
    EmptyArgument { position: ArgPosition },

    #[error("{position} argument must be a numeric string")]
    NotNumeric { position: ArgPosition },

    #[error("Invalid json format - {payload}")]
    InvalidJson { payload: String, reason: String },

    #[error("{field} must be required")]
    MissingField { field: &'static str },

    #[error("{field} must be a non-empty string")]
    EmptyField { field: &'static str },

    #[error("The key {key} has already existed!")]
    AlreadyExists { key: String },

    #[error("Item does not exist: {key}")]
    NotFound { key: String },

    #[error("Failed to decode JSON of: {key}: {reason}")]
    CorruptState { key: String, reason: String },

    /// A stored record no longer matches its shape while being updated.
    #[error("Failed to {action} record at {key}: {reason}")]
    Codec {
        action: &'static str,
        key: String,
        reason: String,
    },

    #[error("Failed to {action} state for {key}: {source}")]
    Storage {
        action: &'static str,
        key: String,
        #[source]
        source: LedgerError,
    },
}

impl ChaincodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFunction { .. }
            | Self::IncorrectArgumentCount { .. }
            | Self::EmptyArgument { .. }
            | Self::NotNumeric { .. }
            | Self::InvalidJson { .. }
            | Self::MissingField { .. }
            | Self::EmptyField { .. } => ErrorKind::InvalidInput,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::CorruptState { .. } => ErrorKind::CorruptState,
            Self::Codec { .. } | Self::Storage { .. } => ErrorKind::StorageError,
        }
    }

    /// Adapter for `map_err` on ledger calls.
    pub(crate) fn storage<'a>(
        action: &'static str,
        key: &'a str,
    ) -> impl FnOnce(LedgerError) -> Self + 'a {
        move |source| Self::Storage {
            action,
            key: key.to_string(),
            source,
        }
    }
}

/// Result alias for chaincode operations.
pub type ChaincodeResult<T> = Result<T, ChaincodeError>;
