//! ETRNL HTTP client

use super::types::{VerifyRequest, VerifyResponse};
use crate::config::ProviderEndpoint;
use crate::providers::{http_client, transport_error, unreachable};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use titan_core::{OracleError, OracleProvider, TitanResult};

const PROVIDER: OracleProvider = OracleProvider::Etrnl;

/// ETRNL API client.
pub struct EtrnlClient {
    client: Client,
    endpoint: ProviderEndpoint,
}

impl EtrnlClient {
    pub fn new(endpoint: ProviderEndpoint, timeout: Duration) -> TitanResult<Self> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            endpoint,
        })
    }

    /// Send one verification request.
    ///
    /// 5xx answers, refused credentials and bodies that are not a
    /// verification response are transport-level failures. Any other status
    /// is decoded, since ETRNL reports rejections in the body.
    pub async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, OracleError> {
        let started = Instant::now();
        let response = self
            .client
            .post(&self.endpoint.url)
            .header("API-KEY", &self.endpoint.api_key)
            .json(request)
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

        if status.is_server_error() {
            return Err(unreachable(PROVIDER, format!("upstream returned {}", status)));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(unreachable(PROVIDER, "upstream refused credentials"));
        }

        response
            .json::<VerifyResponse>()
            .await
            .map_err(|e| transport_error(PROVIDER, e))
    }
}

impl std::fmt::Debug for EtrnlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtrnlClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
