//! TITAN API - HTTP and PostgreSQL Layer
//!
//! Exposes the verification and minting core over HTTP (Axum) and provides
//! the production storage backend on PostgreSQL. Requests are normalized
//! here; every decision about authenticity, replay, serials and ownership is
//! made in `titan-mint`.

#[macro_use]
pub mod macros;

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::ApiConfig;
pub use db::{DbConfig, PgStore, PgTx};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
