//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use titan_mint::ScanService;
use titan_oracle::OracleRegistry;
use titan_storage::CardStore;

use crate::config::ApiConfig;
use crate::telemetry::instrument_oracles;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Verification and minting pipeline.
    pub scans: Arc<ScanService>,
    /// Direct store access for claims, card reads and readiness.
    pub store: Arc<dyn CardStore>,
    pub config: Arc<ApiConfig>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the store and oracles together. Every oracle is wrapped so its
    /// latency lands in the request-duration histogram.
    pub fn new(store: Arc<dyn CardStore>, oracles: OracleRegistry, config: ApiConfig) -> Self {
        let scans = ScanService::new(store.clone(), instrument_oracles(&oracles));
        Self {
            scans: Arc::new(scans),
            store,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(Arc<ScanService>, scans);
crate::impl_from_ref!(Arc<dyn CardStore>, store);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(Instant, start_time);
