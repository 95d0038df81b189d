use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tally_ledger::LocalLedger;
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_MAX_BODY_BYTES;
use crate::handler;

/// State shared by every request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub ledger: Arc<LocalLedger>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(ledger: Arc<LocalLedger>) -> Self {
        Self {
            ledger,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Build the axum router with all Tally endpoints.
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/:kind/invoke", post(handler::invoke_handler))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
