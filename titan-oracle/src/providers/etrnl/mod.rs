//! ETRNL provider implementation
//!
//! Verifies tamper-token and MAC proofs against ETRNL's verify-authenticity
//! endpoint.

pub mod client;
pub mod types;

pub use client::EtrnlClient;

use crate::config::ProviderEndpoint;
use crate::providers::{rejected, unreachable};
use crate::AuthenticityOracle;
use async_trait::async_trait;
use std::time::Duration;
use titan_core::{OracleError, OracleProvider, OracleVerdict, ProofMaterial, TitanResult};
use types::{VerifyRequest, VerifyResponse};

/// Oracle backed by ETRNL.
#[derive(Debug)]
pub struct EtrnlOracle {
    client: EtrnlClient,
}

impl EtrnlOracle {
    pub fn new(endpoint: ProviderEndpoint, timeout: Duration) -> TitanResult<Self> {
        Ok(Self {
            client: EtrnlClient::new(endpoint, timeout)?,
        })
    }
}

/// Build the request body, refusing proof shapes ETRNL does not understand.
fn build_request(tag_id: &str, proof: &ProofMaterial) -> Result<VerifyRequest, OracleError> {
    let (enc, e_code, tt, cmac) = match proof {
        ProofMaterial::TamperToken {
            enc,
            e_code,
            tamper_token,
        } => (enc, e_code, Some(tamper_token.clone()), None),
        ProofMaterial::Mac { enc, e_code, cmac } => (enc, e_code, None, Some(cmac.clone())),
        other => {
            return Err(rejected(
                OracleProvider::Etrnl,
                format!("unsupported proof mode {}", other.mode()),
            ))
        }
    };
    Ok(VerifyRequest {
        tag_id: tag_id.to_string(),
        e_code: e_code.clone(),
        enc: enc.clone(),
        tt,
        cmac,
    })
}

/// Normalize an ETRNL answer into a verdict.
fn normalize(response: VerifyResponse) -> Result<OracleVerdict, OracleError> {
    if response.success != Some(true) {
        let reason = response
            .message
            .unwrap_or_else(|| "verification unsuccessful".to_string());
        return Err(rejected(OracleProvider::Etrnl, reason));
    }
    if response.authentic != Some(true) {
        return Err(rejected(OracleProvider::Etrnl, "tag not authentic"));
    }
    let counter = response
        .counter()
        .map_err(|reason| unreachable(OracleProvider::Etrnl, reason))?;
    let uid = response
        .uid
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| unreachable(OracleProvider::Etrnl, "authentic response carried no uid"))?;

    Ok(OracleVerdict::authentic(uid, counter).with_tamper(response.tt_curr_status, response.tt_perm_status))
}

#[async_trait]
impl AuthenticityOracle for EtrnlOracle {
    fn provider(&self) -> OracleProvider {
        OracleProvider::Etrnl
    }

    async fn verify(&self, tag_id: &str, proof: &ProofMaterial) -> Result<OracleVerdict, OracleError> {
        let request = build_request(tag_id, proof)?;
        let response = self.client.verify(&request).await?;
        normalize(response)
    }
}
