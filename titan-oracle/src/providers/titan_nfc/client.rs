//! Titan NFC HTTP client

use super::types::VerifyResponse;
use crate::config::ProviderEndpoint;
use crate::providers::{http_client, transport_error, unreachable};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use titan_core::{OracleError, OracleProvider, TitanResult};

const PROVIDER: OracleProvider = OracleProvider::TitanNfc;

/// Titan NFC API client.
pub struct TitanNfcClient {
    client: Client,
    endpoint: ProviderEndpoint,
}

impl TitanNfcClient {
    pub fn new(endpoint: ProviderEndpoint, timeout: Duration) -> TitanResult<Self> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            endpoint,
        })
    }

    /// `GET {url}?id=..&data=..`. Anything but 200 is an upstream failure.
    pub async fn verify(&self, tag_id: &str, data: &str) -> Result<VerifyResponse, OracleError> {
        let started = Instant::now();
        let response = self
            .client
            .get(&self.endpoint.url)
            .query(&[("id", tag_id), ("data", data)])
            .header("Authorization", &self.endpoint.api_key)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        tracing::debug!(
            provider = %PROVIDER,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "oracle responded"
        );

        if status != StatusCode::OK {
            return Err(unreachable(PROVIDER, format!("HTTP {}", status.as_u16())));
        }

        response
            .json::<VerifyResponse>()
            .await
            .map_err(|e| transport_error(PROVIDER, e))
    }
}

impl std::fmt::Debug for TitanNfcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TitanNfcClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
