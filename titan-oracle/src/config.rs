//! Oracle configuration loaded from the environment.

use std::time::Duration;
use titan_core::ConfigError;

/// Default ETRNL verification endpoint.
pub const DEFAULT_ETRNL_URL: &str = "https://third-party.etrnl.app/v1/tags/verify-authenticity";

/// Default upper bound on a single oracle call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Endpoint and credential of one upstream provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ProviderEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEndpoint")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Which upstream oracles are available and how to reach them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    /// `None` when `ETRNL_PRIVATE_KEY` is unset.
    pub etrnl: Option<ProviderEndpoint>,
    /// `None` unless both `TITAN_NFC_URL` and `TITAN_NFC_KEY` are set.
    pub titan_nfc: Option<ProviderEndpoint>,
    pub timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            etrnl: None,
            titan_nfc: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OracleConfig {
    /// Create OracleConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ETRNL_URL`: ETRNL endpoint (default: the public verify-authenticity URL)
    /// - `ETRNL_PRIVATE_KEY`: ETRNL API key; ETRNL is disabled when unset
    /// - `TITAN_NFC_URL` / `TITAN_NFC_KEY`: Titan NFC endpoint and key
    /// - `TITAN_ORACLE_TIMEOUT_SECS`: per-call timeout (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let etrnl = get("ETRNL_PRIVATE_KEY").map(|api_key| ProviderEndpoint {
            url: get("ETRNL_URL").unwrap_or_else(|| DEFAULT_ETRNL_URL.to_string()),
            api_key,
        });

        let titan_nfc = match (get("TITAN_NFC_URL"), get("TITAN_NFC_KEY")) {
            (Some(url), Some(api_key)) => Some(ProviderEndpoint { url, api_key }),
            _ => None,
        };

        let timeout = match get("TITAN_ORACLE_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "TITAN_ORACLE_TIMEOUT_SECS".into(),
                        value: raw,
                        reason: "expected a positive number of seconds".into(),
                    })
                }
            },
        };

        Ok(Self {
            etrnl,
            titan_nfc,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_keys() {
        let config = OracleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, OracleConfig::default());
    }

    #[test]
    fn test_etrnl_uses_default_url() {
        let config = OracleConfig::from_lookup(lookup(&[("ETRNL_PRIVATE_KEY", "secret")])).unwrap();
        let etrnl = config.etrnl.unwrap();
        assert_eq!(etrnl.url, DEFAULT_ETRNL_URL);
        assert!(!format!("{:?}", etrnl).contains("secret"));
    }

    #[test]
    fn test_titan_nfc_needs_url_and_key() {
        let config = OracleConfig::from_lookup(lookup(&[("TITAN_NFC_KEY", "k")])).unwrap();
        assert!(config.titan_nfc.is_none());

        let config = OracleConfig::from_lookup(lookup(&[
            ("TITAN_NFC_KEY", "k"),
            ("TITAN_NFC_URL", "https://nfc.example/verify"),
            ("TITAN_ORACLE_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert!(config.titan_nfc.is_some());
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_timeout_is_config_error() {
        let err = OracleConfig::from_lookup(lookup(&[("TITAN_ORACLE_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "TITAN_ORACLE_TIMEOUT_SECS"));
    }
}
