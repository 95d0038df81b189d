//! HTTP host for Tally.
//!
//! Exposes the chaincode over a local ledger: one `POST /v1/{kind}/invoke`
//! endpoint per entity kind, plus health and info endpoints. Each request runs
//! in its own ledger transaction.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HealthResponse, InvokeResponse};
pub use router::{build_router, AppState};
pub use server::TallyServer;
