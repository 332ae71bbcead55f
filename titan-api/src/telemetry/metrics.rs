//! Prometheus Metrics Definitions
//!
//! Scan, claim and oracle metrics, exposed on `/metrics` for scraping.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder};
use titan_core::{OracleError, OracleProvider, OracleVerdict, ProofMaterial};
use titan_oracle::{AuthenticityOracle, OracleRegistry};

use crate::error::{ApiError, ApiResult};

/// Oracle round-trip buckets (seconds). Upstream calls time out at 10s by default.
const ORACLE_LATENCY_BUCKETS: &[f64] = &[0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<TitanMetrics>> = Lazy::new(TitanMetrics::new);

/// The registered metrics, or `None` if registration failed at startup.
pub fn metrics() -> Option<&'static TitanMetrics> {
    METRICS.as_ref().ok()
}

/// Container for all TITAN metrics.
#[derive(Clone)]
pub struct TitanMetrics {
    /// Scan attempts - labels: provider, outcome (minted, repeat or failure reason)
    pub scans_total: CounterVec,

    /// Oracle call duration histogram - labels: provider
    pub oracle_request_duration_seconds: HistogramVec,

    /// Claim attempts - labels: outcome (ok or failure reason)
    pub claims_total: CounterVec,
}

impl TitanMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            scans_total: register_counter_vec!(
                "titan_scans_total",
                "Total number of scan attempts",
                &["provider", "outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register scans_total: {}", e)))?,

            oracle_request_duration_seconds: register_histogram_vec!(
                "titan_oracle_request_duration_seconds",
                "Authenticity oracle request duration in seconds",
                &["provider"],
                ORACLE_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| {
                ApiError::internal_error(format!("Failed to register oracle_request_duration_seconds: {}", e))
            })?,

            claims_total: register_counter_vec!(
                "titan_claims_total",
                "Total number of claim attempts",
                &["outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register claims_total: {}", e)))?,
        })
    }

    pub fn record_scan(&self, provider: OracleProvider, outcome: &str) {
        self.scans_total
            .with_label_values(&[provider.as_db_str(), outcome])
            .inc();
    }

    pub fn observe_oracle(&self, provider: OracleProvider, duration_secs: f64) {
        self.oracle_request_duration_seconds
            .with_label_values(&[provider.as_db_str()])
            .observe(duration_secs);
    }

    pub fn record_claim(&self, outcome: &str) {
        self.claims_total.with_label_values(&[outcome]).inc();
    }
}

// ============================================================================
// ORACLE TIMING
// ============================================================================

/// Wraps an oracle and records each call's latency.
pub struct TimedOracle {
    inner: Arc<dyn AuthenticityOracle>,
}

impl TimedOracle {
    pub fn new(inner: Arc<dyn AuthenticityOracle>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AuthenticityOracle for TimedOracle {
    fn provider(&self) -> OracleProvider {
        self.inner.provider()
    }

    async fn verify(&self, tag_id: &str, proof: &ProofMaterial) -> Result<OracleVerdict, OracleError> {
        let start = Instant::now();
        let result = self.inner.verify(tag_id, proof).await;
        if let Some(m) = metrics() {
            m.observe_oracle(self.inner.provider(), start.elapsed().as_secs_f64());
        }
        result
    }
}

/// Copy of `registry` with every adapter wrapped in a [`TimedOracle`].
pub fn instrument_oracles(registry: &OracleRegistry) -> OracleRegistry {
    registry
        .configured()
        .into_iter()
        .filter_map(|provider| registry.get(provider).ok())
        .fold(OracleRegistry::new(), |timed, oracle| {
            timed.with(Arc::new(TimedOracle::new(oracle)))
        })
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    // Touch the registry so the families exist before the first scan.
    let _ = metrics();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
