//! Titan NFC provider implementation

pub mod client;
pub mod types;

pub use client::TitanNfcClient;

use crate::config::ProviderEndpoint;
use crate::providers::{rejected, unreachable};
use crate::AuthenticityOracle;
use async_trait::async_trait;
use std::time::Duration;
use titan_core::{OracleError, OracleProvider, OracleVerdict, ProofMaterial, TitanResult};
use types::VerifyResponse;

const PROVIDER: OracleProvider = OracleProvider::TitanNfc;

/// Oracle backed by the Titan NFC service. Accepts sealed payloads only.
#[derive(Debug)]
pub struct TitanNfcOracle {
    client: TitanNfcClient,
}

impl TitanNfcOracle {
    pub fn new(endpoint: ProviderEndpoint, timeout: Duration) -> TitanResult<Self> {
        Ok(Self {
            client: TitanNfcClient::new(endpoint, timeout)?,
        })
    }
}

fn normalize(tag_id: &str, response: VerifyResponse) -> Result<OracleVerdict, OracleError> {
    let details = match response {
        VerifyResponse::Bare(false) => return Err(rejected(PROVIDER, "tag not authentic")),
        // A bare `true` has no counter, and the replay guard needs one.
        VerifyResponse::Bare(true) => {
            return Err(unreachable(PROVIDER, "authentic response carried no counter"))
        }
        VerifyResponse::Detailed(details) => details,
    };

    if details.authentic != Some(true) {
        return Err(rejected(PROVIDER, "tag not authentic"));
    }
    let counter = details
        .ctr
        .ok_or_else(|| unreachable(PROVIDER, "authentic response carried no counter"))?;
    let uid = details
        .uid
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| tag_id.to_string());

    Ok(OracleVerdict::authentic(uid, counter).with_tamper(details.status, details.permanent_status))
}

#[async_trait]
impl AuthenticityOracle for TitanNfcOracle {
    fn provider(&self) -> OracleProvider {
        PROVIDER
    }

    async fn verify(&self, tag_id: &str, proof: &ProofMaterial) -> Result<OracleVerdict, OracleError> {
        let data = match proof {
            ProofMaterial::Sealed { data } => data,
            other => {
                return Err(rejected(
                    PROVIDER,
                    format!("unsupported proof mode {}", other.mode()),
                ))
            }
        };
        let response = self.client.verify(tag_id, data).await?;
        normalize(tag_id, response)
    }
}
