//! Fisiopay Server
//!
//! HTTP boundary of the payment-document pipeline: the multipart upload
//! endpoint, the payment-control routes, and the wiring between registry,
//! storage, sandbox, extractor and ledger.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod orchestrator;
pub mod registry;
pub mod storage;

use config::ServerConfig;
use fisiopay_extractor::FinancialExtractor;
use fisiopay_ledger::PaymentLedger;
use fisiopay_sandbox::TextSandbox;
use handlers::{create_router, AppState};
use registry::PhysiotherapistRegistry;
use std::sync::Arc;
use storage::PaymentStore;
use tokio::net::TcpListener;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Extractor rule table rejected
    #[error("Extractor configuration error: {0}")]
    Extractor(String),

    /// Sandbox could not be set up
    #[error("Sandbox configuration error: {0}")]
    Sandbox(String),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build the shared application state from configuration
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let extractor = FinancialExtractor::new(config.extractor.clone())
        .map_err(|e| ServerError::Extractor(e.to_string()))?;
    let sandbox =
        TextSandbox::from_config(&config.sandbox).map_err(|e| ServerError::Sandbox(e.to_string()))?;

    Ok(AppState {
        registry: Arc::new(PhysiotherapistRegistry::from_config(&config.physiotherapists)),
        ledger: Arc::new(PaymentLedger::new()),
        store: Arc::new(PaymentStore::new(config.uploads_root.clone())),
        sandbox: Arc::new(sandbox),
        extractor: Arc::new(extractor),
    })
}

/// Start the HTTP server
///
/// Initializes tracing, builds the application state and serves until
/// shutdown.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Fisiopay server");
    info!("Bind address: {}", config.bind_addr());
    info!("Uploads root: {}", config.uploads_root.display());
    info!("Registered physiotherapists: {}", config.physiotherapists.len());

    let state = build_state(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_from_default_config() {
        let config = ServerConfig::default_test_config();
        let state = build_state(&config).unwrap();
        assert_eq!(state.registry.count(), 1);
        assert!(state.ledger.list_controls().is_empty());
    }
}
