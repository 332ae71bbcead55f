//! TITAN Oracle - Physical tag authenticity verification
//!
//! Provider-agnostic trait for the external services that vouch for an NFC
//! tag's proof material, plus one adapter per upstream service. Adapters
//! normalize each upstream's response into an [`OracleVerdict`] so the
//! minting core never sees provider-specific shapes.

pub mod config;
pub mod providers;

pub use config::OracleConfig;
pub use providers::{EtrnlOracle, TitanNfcOracle};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use titan_core::{OracleError, OracleProvider, OracleVerdict, ProofMaterial, TitanResult};

// ============================================================================
// AUTHENTICITY ORACLE TRAIT
// ============================================================================

/// An external service that verifies tag proof material.
///
/// Implementations make exactly one outbound call per `verify` and keep no
/// local state between calls. They never retry.
///
/// # Errors
/// * `OracleError::Unreachable` - transport failure, timeout, non-success
///   status or a body that cannot be normalized
/// * `OracleError::Rejected` - the upstream answered and did not vouch for
///   the tag, or the proof shape is not one this provider accepts
#[async_trait]
pub trait AuthenticityOracle: Send + Sync {
    /// Which upstream this adapter talks to.
    fn provider(&self) -> OracleProvider;

    /// Verify `proof` for the tag presenting `tag_id`.
    async fn verify(&self, tag_id: &str, proof: &ProofMaterial) -> Result<OracleVerdict, OracleError>;
}

// ============================================================================
// ORACLE REGISTRY
// ============================================================================

/// Configured oracle adapters keyed by provider.
///
/// A provider without an entry is reported as `OracleError::NotConfigured`.
#[derive(Clone, Default)]
pub struct OracleRegistry {
    oracles: BTreeMap<OracleProvider, Arc<dyn AuthenticityOracle>>,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration, skipping unconfigured providers.
    pub fn from_config(config: &OracleConfig) -> TitanResult<Self> {
        let mut registry = Self::new();
        if let Some(etrnl) = &config.etrnl {
            registry.register(Arc::new(EtrnlOracle::new(etrnl.clone(), config.timeout)?));
        }
        if let Some(titan_nfc) = &config.titan_nfc {
            registry.register(Arc::new(TitanNfcOracle::new(titan_nfc.clone(), config.timeout)?));
        }
        Ok(registry)
    }

    /// Register an adapter, replacing any previous one for the same provider.
    pub fn register(&mut self, oracle: Arc<dyn AuthenticityOracle>) {
        self.oracles.insert(oracle.provider(), oracle);
    }

    pub fn with(mut self, oracle: Arc<dyn AuthenticityOracle>) -> Self {
        self.register(oracle);
        self
    }

    pub fn get(&self, provider: OracleProvider) -> Result<Arc<dyn AuthenticityOracle>, OracleError> {
        self.oracles
            .get(&provider)
            .cloned()
            .ok_or(OracleError::NotConfigured { provider })
    }

    pub fn configured(&self) -> Vec<OracleProvider> {
        self.oracles.keys().copied().collect()
    }
}

impl std::fmt::Debug for OracleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleRegistry")
            .field("configured", &self.configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(OracleProvider);

    #[async_trait]
    impl AuthenticityOracle for Fixed {
        fn provider(&self) -> OracleProvider {
            self.0
        }

        async fn verify(&self, _tag_id: &str, _proof: &ProofMaterial) -> Result<OracleVerdict, OracleError> {
            Ok(OracleVerdict::authentic("04AA", 1))
        }
    }

    #[test]
    fn test_missing_provider_is_not_configured() {
        let registry = OracleRegistry::new().with(Arc::new(Fixed(OracleProvider::Etrnl)));
        assert!(registry.get(OracleProvider::Etrnl).is_ok());
        assert_eq!(
            registry.get(OracleProvider::TitanNfc).err(),
            Some(OracleError::NotConfigured {
                provider: OracleProvider::TitanNfc
            })
        );
        assert_eq!(registry.configured(), vec![OracleProvider::Etrnl]);
    }

    #[test]
    fn test_empty_config_registers_nothing() {
        let registry = OracleRegistry::from_config(&OracleConfig::default()).unwrap();
        assert!(registry.configured().is_empty());
    }
}
