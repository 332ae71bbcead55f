//! Scan orchestration: oracle first, then the binder.

use crate::binder::InstanceBinder;
use crate::resolver::TemplateResolver;
use std::sync::Arc;
use titan_core::{
    BindEvidence, BindRequest, CardInstance, MintError, OracleError, OracleProvider, ScanOutcome,
    ScanRequest, TitanError, TitanResult, VerifiedScan,
};
use titan_oracle::OracleRegistry;
use titan_storage::CardStore;

/// Entry point of the verification and minting core.
#[derive(Debug, Clone)]
pub struct ScanService {
    oracles: OracleRegistry,
    binder: InstanceBinder,
}

impl ScanService {
    pub fn new(store: Arc<dyn CardStore>, oracles: OracleRegistry) -> Self {
        Self {
            oracles,
            binder: InstanceBinder::new(store),
        }
    }

    pub fn with_resolver(mut self, resolver: TemplateResolver) -> Self {
        self.binder = self.binder.with_resolver(resolver);
        self
    }

    pub fn oracles(&self) -> &OracleRegistry {
        &self.oracles
    }

    /// Verify a scan with its oracle and bind it to a card instance.
    ///
    /// No storage is touched until the oracle has vouched for the tag, and
    /// nothing is retried here; retrying after a retryable error is the
    /// caller's decision.
    pub async fn scan(&self, request: &ScanRequest) -> TitanResult<ScanOutcome> {
        let oracle = self.oracles.get(request.provider)?;

        let verdict = match oracle.verify(&request.tag_external_id, &request.proof).await {
            Ok(verdict) if verdict.authentic => verdict,
            Ok(_) => {
                let err = TitanError::from(OracleError::Rejected {
                    provider: request.provider,
                    reason: "tag not authentic".into(),
                });
                log_rejection(request, &err);
                return Err(err);
            }
            Err(err) => {
                let err = TitanError::from(err);
                log_rejection(request, &err);
                return Err(err);
            }
        };

        let verified = VerifiedScan::from_verdict(request, verdict);
        match self
            .binder
            .bind(&verified, request.template_hint.as_deref())
            .await
        {
            Ok(outcome) => {
                tracing::info!(
                    provider = %request.provider,
                    card_id = %outcome.card_id,
                    template_id = %outcome.template_id,
                    serial_no = outcome.serial_no,
                    minted = outcome.minted,
                    state = %outcome.state,
                    "scan accepted"
                );
                Ok(outcome)
            }
            Err(err) => {
                log_rejection(request, &err);
                Err(err)
            }
        }
    }

    /// Bind a tag to a template on an operator's word.
    ///
    /// Proof evidence goes through the ETRNL oracle first and binds the uid
    /// and counter it reports. A bare uid is bound with counter 0.
    pub async fn bind(&self, request: &BindRequest) -> TitanResult<CardInstance> {
        let (tag_uid, counter) = match &request.evidence {
            BindEvidence::Proof(proof) => {
                let provider = OracleProvider::Etrnl;
                let verdict = self
                    .oracles
                    .get(provider)?
                    .verify(&request.tag_external_id, proof)
                    .await?;
                if !verdict.authentic {
                    tracing::warn!(tag = %request.tag_external_id, "bind rejected as not authentic");
                    return Err(OracleError::Rejected {
                        provider,
                        reason: "tag not authentic".into(),
                    }
                    .into());
                }
                (verdict.uid, verdict.counter)
            }
            BindEvidence::Uid(uid) => (uid.clone(), 0),
        };

        self.binder
            .bind_as_admin(request.template_id, &tag_uid, &request.tag_external_id, counter)
            .await
    }
}

/// Rejected scans are not persisted, so this line is their only record.
fn log_rejection(request: &ScanRequest, err: &TitanError) {
    let ip = request.client.ip.as_deref().unwrap_or("-");
    let tag = request.tag_external_id.as_str();
    match err {
        TitanError::Mint(MintError::Replay {
            tag_uid,
            observed,
            last,
        }) => tracing::warn!(
            provider = %request.provider, tag, tag_uid = %tag_uid, observed, last, client_ip = ip,
            "scan rejected as replay"
        ),
        TitanError::Oracle(OracleError::Rejected { reason, .. }) => tracing::warn!(
            provider = %request.provider, tag, reason = %reason, client_ip = ip,
            "scan rejected as not authentic"
        ),
        TitanError::Oracle(_) | TitanError::Storage(_) | TitanError::Config(_) => tracing::error!(
            provider = %request.provider, tag, error = %err, client_ip = ip,
            "scan failed"
        ),
        _ => tracing::warn!(
            provider = %request.provider, tag, error = %err, client_ip = ip,
            "scan rejected"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_core::{
        AthleteId, CardTemplate, CardVersion, ClientMeta, EntityIdType, OracleProvider,
        OracleVerdict, ProofMaterial,
    };
    use titan_storage::MemoryStore;
    use titan_test_utils::MockOracle;

    fn request(tag: &str, hint: Option<&str>) -> ScanRequest {
        ScanRequest {
            provider: OracleProvider::Etrnl,
            tag_external_id: tag.to_string(),
            proof: ProofMaterial::Mac {
                enc: "ENC".into(),
                e_code: "00".into(),
                cmac: "CAFE".into(),
            },
            template_hint: hint.map(str::to_string),
            client: ClientMeta::default(),
        }
    }

    async fn service(oracle: MockOracle) -> (MemoryStore, ScanService) {
        let store = MemoryStore::new();
        store
            .template_insert(&CardTemplate::new(AthleteId::now_v7(), CardVersion::Regular).with_sku("SL-REG"))
            .await
            .unwrap();
        let registry = OracleRegistry::new().with(Arc::new(oracle));
        (store.clone(), ScanService::new(Arc::new(store), registry))
    }

    #[tokio::test]
    async fn test_rejected_proof_touches_nothing() {
        let oracle = MockOracle::new(OracleProvider::Etrnl);
        oracle.push_err(OracleError::Rejected {
            provider: OracleProvider::Etrnl,
            reason: "bad cmac".into(),
        });
        let (store, service) = service(oracle.clone()).await;

        let err = service.scan(&request("TAG-A", Some("SL-REG"))).await.unwrap_err();
        assert!(matches!(err, TitanError::Oracle(OracleError::Rejected { .. })));
        assert_eq!(store.instance_count(), 0);
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_authentic_verdict_is_rejection() {
        let oracle = MockOracle::new(OracleProvider::Etrnl);
        let mut verdict = OracleVerdict::authentic("04AA", 1);
        verdict.authentic = false;
        oracle.push_ok(verdict);
        let (store, service) = service(oracle).await;

        let err = service.scan(&request("TAG-A", Some("SL-REG"))).await.unwrap_err();
        assert!(matches!(err, TitanError::Oracle(OracleError::Rejected { .. })));
        assert_eq!(store.scan_event_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_oracle_is_retryable() {
        let oracle = MockOracle::new(OracleProvider::Etrnl);
        oracle.push_err(OracleError::Unreachable {
            provider: OracleProvider::Etrnl,
            reason: "timeout".into(),
        });
        let (store, service) = service(oracle).await;

        let err = service.scan(&request("TAG-A", Some("SL-REG"))).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.instance_count(), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_provider() {
        let (_, service) = service(MockOracle::new(OracleProvider::Etrnl)).await;
        let mut req = request("TAG-A", None);
        req.provider = OracleProvider::TitanNfc;
        let err = service.scan(&req).await.unwrap_err();
        assert_eq!(
            err,
            OracleError::NotConfigured {
                provider: OracleProvider::TitanNfc
            }
            .into()
        );
    }

    fn bind_request(template_id: titan_core::TemplateId, evidence: BindEvidence) -> BindRequest {
        BindRequest {
            template_id,
            tag_external_id: "TAG-A".into(),
            evidence,
        }
    }

    #[tokio::test]
    async fn test_bind_with_proof_uses_oracle_uid() {
        let oracle = MockOracle::new(OracleProvider::Etrnl);
        oracle.push_ok(OracleVerdict::authentic("04AA", 7));
        let (store, service) = service(oracle.clone()).await;
        let template = store.templates_list().await.unwrap().remove(0);

        let proof = request("TAG-A", None).proof;
        let card = service
            .bind(&bind_request(template.template_id, BindEvidence::Proof(proof)))
            .await
            .unwrap();
        assert_eq!(card.tag_uid, "04AA");
        assert_eq!(card.last_ctr, 7);
        assert_eq!(card.serial_no, 1);
        assert_eq!(oracle.calls(), 1);

        // The next scan must move past the bound counter.
        oracle.push_ok(OracleVerdict::authentic("04AA", 7));
        let err = service.scan(&request("TAG-A", None)).await.unwrap_err();
        assert!(matches!(err, TitanError::Mint(MintError::Replay { .. })));
    }

    #[tokio::test]
    async fn test_bind_with_uid_skips_oracle() {
        let oracle = MockOracle::new(OracleProvider::Etrnl);
        let (store, service) = service(oracle.clone()).await;
        let template = store.templates_list().await.unwrap().remove(0);

        let card = service
            .bind(&bind_request(template.template_id, BindEvidence::Uid("04BB".into())))
            .await
            .unwrap();
        assert_eq!(card.tag_uid, "04BB");
        assert_eq!(card.last_ctr, 0);
        assert_eq!(oracle.calls(), 0);
        assert_eq!(store.scan_event_count(), 0);
    }

    #[tokio::test]
    async fn test_bind_with_non_authentic_proof_binds_nothing() {
        let oracle = MockOracle::new(OracleProvider::Etrnl);
        let mut verdict = OracleVerdict::authentic("04AA", 1);
        verdict.authentic = false;
        oracle.push_ok(verdict);
        let (store, service) = service(oracle).await;
        let template = store.templates_list().await.unwrap().remove(0);

        let proof = request("TAG-A", None).proof;
        let err = service
            .bind(&bind_request(template.template_id, BindEvidence::Proof(proof)))
            .await
            .unwrap_err();
        assert!(matches!(err, TitanError::Oracle(OracleError::Rejected { .. })));
        assert_eq!(store.instance_count(), 0);
    }

    #[tokio::test]
    async fn test_authentic_scan_mints() {
        let oracle = MockOracle::new(OracleProvider::Etrnl);
        oracle.push_ok(OracleVerdict::authentic("04AA", 1));
        let (store, service) = service(oracle).await;

        let outcome = service.scan(&request("TAG-A", Some("SL-REG"))).await.unwrap();
        assert!(outcome.minted);
        let card = store.instance_get(outcome.card_id).await.unwrap().unwrap();
        assert_eq!(card.tag_uid, "04AA");
        assert_eq!(card.tag_external_id, "TAG-A");
    }
}
