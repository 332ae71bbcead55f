//! TITAN API Server Entry Point
//!
//! Loads configuration, applies the schema, wires the oracles and starts
//! the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use titan_api::telemetry::init_tracing;
use titan_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, DbConfig, PgStore};
use titan_oracle::{OracleConfig, OracleRegistry};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing()?;

    let api_config = ApiConfig::from_env()?;
    let db_config = DbConfig::from_env()?;
    let oracle_config = OracleConfig::from_env()?;
    tracing::debug!(?api_config, ?db_config, "Configuration loaded");

    let store = PgStore::from_config(&db_config)?;
    store.migrate().await?;

    let oracles = OracleRegistry::from_config(&oracle_config)?;
    if oracles.configured().is_empty() {
        tracing::warn!("No authenticity oracle configured; every scan will fail with oracle_unreachable");
    } else {
        tracing::info!(providers = ?oracles.configured(), "Authenticity oracles configured");
    }

    let addr = api_config.bind_addr()?;
    let state = AppState::new(Arc::new(store), oracles, api_config);
    let app = create_api_router(state)?;

    tracing::info!(%addr, "Starting TITAN API server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>());
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
