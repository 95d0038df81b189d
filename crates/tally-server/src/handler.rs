use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tally_chaincode::{Chaincode, ErrorKind, Invocation, Response, ERROR};
use tally_types::EntityKind;
use tracing::debug;

use crate::router::AppState;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Body returned by the invoke endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub status: i32,
    pub message: String,
    /// Payload as UTF-8 text; `null` when the invocation returned nothing.
    pub payload: Option<String>,
}

impl From<&Response> for InvokeResponse {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status,
            message: response.message.clone(),
            payload: (!response.payload.is_empty()).then(|| response.payload_text()),
        }
    }
}

/// HTTP status for a chaincode outcome.
pub fn http_status(response: &Response) -> StatusCode {
    match response.error_kind {
        None => StatusCode::OK,
        Some(ErrorKind::InvalidInput) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::AlreadyExists) => StatusCode::CONFLICT,
        Some(ErrorKind::CorruptState | ErrorKind::StorageError) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let kinds: Vec<&str> = EntityKind::ALL.iter().map(EntityKind::name).collect();
    Json(json!({
        "name": "tally-server",
        "version": env!("CARGO_PKG_VERSION"),
        "kinds": kinds,
        "journaled": state.ledger.journal().is_some(),
        "live_keys": state.ledger.len().ok(),
    }))
}

/// Run one invocation in its own ledger transaction.
pub async fn invoke_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(invocation): Json<Invocation>,
) -> (StatusCode, Json<InvokeResponse>) {
    let kind: EntityKind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => {
            let body = InvokeResponse {
                status: ERROR,
                message: e.to_string(),
                payload: None,
            };
            return (StatusCode::NOT_FOUND, Json(body));
        }
    };

    let ledger = state.ledger.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let tx = ledger.begin();
        debug!(kind = %kind, tx_id = %tx.tx_id().short_id(), function = %invocation.function, "invoke request");
        Chaincode::new(kind).invoke_with(&tx, &invocation)
    })
    .await;

    match joined {
        Ok(response) => (http_status(&response), Json(InvokeResponse::from(&response))),
        Err(e) => {
            let body = InvokeResponse {
                status: ERROR,
                message: format!("invocation aborted: {e}"),
                payload: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(http_status(&Response::success(Vec::new())), StatusCode::OK);
        for (kind, status) in [
            (ErrorKind::InvalidInput, StatusCode::BAD_REQUEST),
            (ErrorKind::NotFound, StatusCode::NOT_FOUND),
            (ErrorKind::AlreadyExists, StatusCode::CONFLICT),
            (ErrorKind::CorruptState, StatusCode::INTERNAL_SERVER_ERROR),
            (ErrorKind::StorageError, StatusCode::INTERNAL_SERVER_ERROR),
        ] {
            assert_eq!(http_status(&Response::error(kind, "x")), status, "{kind}");
        }
    }

    #[test]
    fn empty_payload_is_null() {
        let body = InvokeResponse::from(&Response::success(Vec::new()));
        assert_eq!(body.payload, None);

        let body = InvokeResponse::from(&Response::success(b"[]".to_vec()));
        assert_eq!(body.payload.as_deref(), Some("[]"));
    }
}
