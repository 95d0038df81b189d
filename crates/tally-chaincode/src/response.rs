use serde::{Deserialize, Serialize};

use crate::error::{ChaincodeResult, ErrorKind};

/// Status code of a successful invocation.
pub const OK: i32 = 200;
/// Status code of a failed invocation.
pub const ERROR: i32 = 500;

/// Outcome of one chaincode invocation as seen by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: i32,
    /// Failure message; empty on success.
    pub message: String,
    pub payload: Vec<u8>,
    /// Failure class; `None` on success.
    pub error_kind: Option<ErrorKind>,
}

impl Response {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: OK,
            message: String::new(),
            payload,
            error_kind: None,
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: ERROR,
            message: message.into(),
            payload: Vec::new(),
            error_kind: Some(kind),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OK
    }

    /// Payload as UTF-8, replacing invalid sequences.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

impl From<ChaincodeResult<Vec<u8>>> for Response {
    fn from(result: ChaincodeResult<Vec<u8>>) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(e) => Self::error(e.kind(), e.to_string()),
        }
    }
}
