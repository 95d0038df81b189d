use std::sync::Arc;

use tally_ledger::LocalLedger;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState};

/// HTTP host for the chaincode over one local ledger.
pub struct TallyServer {
    config: ServerConfig,
    ledger: Arc<LocalLedger>,
}

impl TallyServer {
    /// Open the ledger named by `config`, replaying its journal if one is
    /// configured.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let ledger = match &config.journal {
            Some(path) => LocalLedger::open(path, config.journal_config())?,
            None => LocalLedger::new(),
        };
        Ok(Self::with_ledger(config, Arc::new(ledger)))
    }

    pub fn with_ledger(config: ServerConfig, ledger: Arc<LocalLedger>) -> Self {
        Self { config, ledger }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<LocalLedger> {
        &self.ledger
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let state =
            AppState::new(self.ledger.clone()).with_max_body_bytes(self.config.max_body_bytes);
        build_router(state)
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            addr = %self.config.bind_addr,
            journal = ?self.config.journal,
            live_keys = self.ledger.len()?,
            "tally server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = TallyServer::new(ServerConfig::default()).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:7054".parse().unwrap());
        assert!(server.ledger().journal().is_none());
    }

    #[test]
    fn journaled_server_opens_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            journal: Some(dir.path().join("ledger.journal")),
            ..ServerConfig::default()
        };
        let server = TallyServer::new(config).unwrap();
        assert!(server.ledger().journal().is_some());
        let _router = server.router();
    }
}
