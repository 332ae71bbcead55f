//! Upstream oracle adapters
//!
//! One submodule per verification service. Each exposes an HTTP client and an
//! [`AuthenticityOracle`](crate::AuthenticityOracle) implementation on top of it.

pub mod etrnl;
pub mod titan_nfc;

pub use etrnl::{EtrnlClient, EtrnlOracle};
pub use titan_nfc::{TitanNfcClient, TitanNfcOracle};

use std::time::Duration;
use titan_core::{ConfigError, OracleError, OracleProvider, TitanResult};

pub(crate) fn unreachable(provider: OracleProvider, reason: impl Into<String>) -> OracleError {
    OracleError::Unreachable {
        provider,
        reason: reason.into(),
    }
}

pub(crate) fn rejected(provider: OracleProvider, reason: impl Into<String>) -> OracleError {
    OracleError::Rejected {
        provider,
        reason: reason.into(),
    }
}

/// Map a reqwest failure. Timeouts get their own wording for the logs.
pub(crate) fn transport_error(provider: OracleProvider, err: reqwest::Error) -> OracleError {
    if err.is_timeout() {
        unreachable(provider, "request timed out")
    } else if err.is_decode() {
        unreachable(provider, format!("malformed response body: {}", err))
    } else {
        unreachable(provider, format!("HTTP request failed: {}", err))
    }
}

pub(crate) fn http_client(provider: OracleProvider, timeout: Duration) -> TitanResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            ConfigError::InvalidValue {
                name: format!("{} http client", provider),
                value: format!("{:?}", timeout),
                reason: e.to_string(),
            }
            .into()
        })
}
