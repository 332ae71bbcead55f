//! REST API Routes Module
//!
//! - Scan endpoints for both oracle providers
//! - Card reads, claims and scan history
//! - The caller's own collection
//! - Admin template listing and tag binding (admin token) when configured
//! - Fulfillment (admin token) when configured
//! - Health checks and Prometheus metrics
//! - CORS support for the browser scanner page

pub mod admin;
pub mod cards;
pub mod collection;
pub mod fulfillment;
pub mod health;
pub mod scan;
pub mod verification;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::state::AppState;
use crate::telemetry::metrics_handler;

pub use admin::create_router as admin_router;
pub use cards::create_router as cards_router;
pub use collection::create_router as collection_router;
pub use fulfillment::create_router as fulfillment_router;
pub use health::create_router as health_router;
pub use scan::create_router as scan_router;
pub use verification::create_router as verification_router;

fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            config.principal_header.clone(),
        ])
        .max_age(Duration::from_secs(3600));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Build the full application router.
///
/// Fails when the configuration is not acceptable for the declared
/// environment (see [`ApiConfig::validate_for_production`]).
pub fn create_api_router(state: AppState) -> ApiResult<Router> {
    state.config.validate_for_production()?;

    let mut api = Router::new()
        .nest("/scan", scan::create_router(state.clone()))
        .nest("/verification", verification::create_router(state.clone()))
        .nest("/cards", cards::create_router(state.clone()))
        .nest("/collection", collection::create_router(state.clone()));

    if state.config.admin_token.is_some() {
        api = api
            .nest("/admin", admin::create_router(state.clone()))
            .nest("/fulfillment", fulfillment::create_router(state.clone()));
    } else {
        tracing::info!("TITAN_ADMIN_TOKEN not set, admin and fulfillment routes disabled");
    }

    Ok(Router::new()
        .nest("/api", api)
        .nest("/health", health::create_router(state.clone()))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config)))
}
