//! TITAN Test Utilities
//!
//! Centralized test infrastructure for the TITAN workspace:
//! - A scriptable mock authenticity oracle
//! - Template fixtures and a seeded in-memory store
//! - Proptest generators for tag identifiers and counters

// Re-export the in-memory store from its source crate
pub use titan_storage::{CardStore, CardTx, MemoryStore};

// Re-export core types for convenience
pub use titan_core::{
    AthleteId, CardId, CardInstance, CardStatus, CardTemplate, CardVersion, ClientMeta,
    EntityIdType, OracleError, OracleProvider, OracleVerdict, PrincipalId, ProofMaterial,
    ScanRequest, TemplateId, TitanError, TitanResult,
};

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use titan_oracle::AuthenticityOracle;

// ============================================================================
// MOCK ORACLE
// ============================================================================

#[derive(Debug, Default)]
struct MockOracleState {
    script: VecDeque<Result<OracleVerdict, OracleError>>,
    tags: HashMap<String, OracleVerdict>,
    calls: usize,
}

/// Scriptable [`AuthenticityOracle`].
///
/// Answers come from the one-shot script first (`push_ok` / `push_err`),
/// then from the per-tag table (`set_tag`). Unknown tags are rejected.
/// Clones share state, so a test can keep a handle after registering one.
#[derive(Debug, Clone)]
pub struct MockOracle {
    provider: OracleProvider,
    state: Arc<Mutex<MockOracleState>>,
}

impl MockOracle {
    pub fn new(provider: OracleProvider) -> Self {
        Self {
            provider,
            state: Arc::new(Mutex::new(MockOracleState::default())),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockOracleState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Queue a one-shot verdict.
    pub fn push_ok(&self, verdict: OracleVerdict) {
        self.with_state(|s| s.script.push_back(Ok(verdict)));
    }

    /// Queue a one-shot failure.
    pub fn push_err(&self, err: OracleError) {
        self.with_state(|s| s.script.push_back(Err(err)));
    }

    /// Answer every scan of `tag_id` as authentic with the given uid and counter.
    pub fn set_tag(&self, tag_id: impl Into<String>, uid: impl Into<String>, counter: i64) {
        let verdict = OracleVerdict::authentic(uid, counter);
        self.with_state(|s| {
            s.tags.insert(tag_id.into(), verdict);
        });
    }

    /// Number of `verify` calls so far.
    pub fn calls(&self) -> usize {
        self.with_state(|s| s.calls)
    }
}

#[async_trait]
impl AuthenticityOracle for MockOracle {
    fn provider(&self) -> OracleProvider {
        self.provider
    }

    async fn verify(&self, tag_id: &str, _proof: &ProofMaterial) -> Result<OracleVerdict, OracleError> {
        let provider = self.provider;
        self.with_state(|s| {
            s.calls += 1;
            if let Some(next) = s.script.pop_front() {
                return next;
            }
            s.tags.get(tag_id).cloned().ok_or_else(|| OracleError::Rejected {
                provider,
                reason: format!("unknown tag {}", tag_id),
            })
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Builder for templates used across tests.
#[derive(Debug, Clone)]
pub struct TemplateFixture {
    template: CardTemplate,
}

impl TemplateFixture {
    pub fn regular() -> Self {
        Self {
            template: CardTemplate::new(AthleteId::now_v7(), CardVersion::Regular),
        }
    }

    pub fn diamond() -> Self {
        Self {
            template: CardTemplate::new(AthleteId::now_v7(), CardVersion::Diamond),
        }
    }

    pub fn sku(mut self, sku: &str) -> Self {
        self.template = self.template.with_sku(sku);
        self
    }

    pub fn group(mut self, group_id: &str) -> Self {
        self.template = self.template.with_external_group(group_id);
        self
    }

    pub fn cap(mut self, cap: i64) -> Self {
        self.template = self.template.with_edition_cap(cap);
        self
    }

    pub fn minted(mut self, minted: i64) -> Self {
        self.template = self.template.with_minted_count(minted);
        self
    }

    pub fn build(self) -> CardTemplate {
        self.template
    }
}

/// A store holding the given templates.
pub async fn seeded_store(templates: &[CardTemplate]) -> TitanResult<MemoryStore> {
    let store = MemoryStore::new();
    for t in templates {
        store.template_insert(t).await?;
    }
    Ok(store)
}

/// MAC-mode proof material with placeholder values.
pub fn mac_proof() -> ProofMaterial {
    ProofMaterial::Mac {
        enc: "9A1F0C77E2B4".to_string(),
        e_code: "00".to_string(),
        cmac: "5C3E9A1D".to_string(),
    }
}

/// An ETRNL scan request for `tag_id` with an optional template hint.
pub fn scan_request(tag_id: &str, hint: Option<&str>) -> ScanRequest {
    ScanRequest {
        provider: OracleProvider::Etrnl,
        tag_external_id: tag_id.to_string(),
        proof: mac_proof(),
        template_hint: hint.map(str::to_string),
        client: ClientMeta::new(Some("198.51.100.4".to_string()), Some("titan-tests".to_string())),
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use proptest::prelude::*;

    /// 7-byte NFC uid rendered as upper-case hex.
    pub fn arb_tag_uid() -> impl Strategy<Value = String> {
        proptest::collection::vec(any::<u8>(), 7)
            .prop_map(|bytes| bytes.iter().map(|b| format!("{:02X}", b)).collect())
    }

    /// Externally visible tag identifier.
    pub fn arb_tag_external_id() -> impl Strategy<Value = String> {
        "[A-Z0-9]{12}"
    }

    /// Tap counters as observed over a tag's lifetime.
    pub fn arb_counters(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
        proptest::collection::vec(0i64..1_000, 1..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_oracle_script_then_table() {
        let oracle = MockOracle::new(OracleProvider::Etrnl);
        oracle.push_err(OracleError::Unreachable {
            provider: OracleProvider::Etrnl,
            reason: "scripted".into(),
        });
        oracle.set_tag("TAG-A", "04AA", 4);

        assert!(oracle.verify("TAG-A", &mac_proof()).await.is_err());
        assert_eq!(oracle.verify("TAG-A", &mac_proof()).await.unwrap().counter, 4);
        assert!(matches!(
            oracle.verify("TAG-B", &mac_proof()).await,
            Err(OracleError::Rejected { .. })
        ));
        assert_eq!(oracle.calls(), 3);
    }

    #[tokio::test]
    async fn test_seeded_store() {
        let t = TemplateFixture::regular().sku("SL-REG").cap(2).build();
        let store = seeded_store(&[t.clone()]).await.unwrap();
        assert_eq!(store.template_get(t.template_id).await.unwrap(), Some(t));
    }
}
