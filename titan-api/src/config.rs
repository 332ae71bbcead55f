//! API Configuration Module
//!
//! Server binding, CORS, the trusted principal header and the admin token.
//! Configuration is loaded from environment variables with sensible defaults
//! for development.

use axum::http::HeaderName;
use std::net::SocketAddr;
use titan_core::ConfigError;

/// Default header the session layer uses to pass the authenticated principal.
pub const DEFAULT_PRINCIPAL_HEADER: &str = "x-principal-id";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5000;

// ============================================================================
// API CONFIGURATION
// ============================================================================

#[derive(Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port to bind.
    pub port: u16,

    /// Header carrying the authenticated principal id. The session layer in
    /// front of this service sets it and drops any copy sent by the client;
    /// it is trusted as-is.
    pub principal_header: HeaderName,

    /// Bearer token for fulfillment routes. `None` leaves them unmounted.
    pub admin_token: Option<String>,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Deployment environment name.
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            principal_header: HeaderName::from_static(DEFAULT_PRINCIPAL_HEADER),
            admin_token: None,
            cors_origins: Vec::new(),
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TITAN_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` / `TITAN_API_PORT`: Port to bind (default: 5000)
    /// - `TITAN_PRINCIPAL_HEADER`: Principal header name (default: x-principal-id)
    /// - `TITAN_ADMIN_TOKEN`: Fulfillment token; fulfillment routes are off when unset
    /// - `TITAN_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `TITAN_ENVIRONMENT`: Deployment environment (default: development)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match get("PORT").or_else(|| get("TITAN_API_PORT")) {
            None => defaults.port,
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT".into(),
                value: raw.clone(),
                reason: "expected a TCP port".into(),
            })?,
        };

        let principal_header = match get("TITAN_PRINCIPAL_HEADER") {
            None => defaults.principal_header,
            Some(raw) => HeaderName::try_from(raw.to_lowercase()).map_err(|_| {
                ConfigError::InvalidValue {
                    name: "TITAN_PRINCIPAL_HEADER".into(),
                    value: raw.clone(),
                    reason: "not a valid header name".into(),
                }
            })?,
        };

        let cors_origins = get("TITAN_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            bind_host: get("TITAN_API_BIND").unwrap_or(defaults.bind_host),
            port,
            principal_header,
            admin_token: get("TITAN_ADMIN_TOKEN"),
            cors_origins,
            environment: get("TITAN_ENVIRONMENT").unwrap_or(defaults.environment),
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    /// Reject settings that are only acceptable in development.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if !self.is_production() {
            return Ok(());
        }
        if self.cors_origins.is_empty() {
            return Err(ConfigError::MissingRequired {
                name: "TITAN_CORS_ORIGINS".into(),
            });
        }
        if let Some(token) = &self.admin_token {
            if token.len() < 32 {
                return Err(ConfigError::InvalidValue {
                    name: "TITAN_ADMIN_TOKEN".into(),
                    value: "<redacted>".into(),
                    reason: "must be at least 32 characters in production".into(),
                });
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| ConfigError::InvalidValue {
            name: "TITAN_API_BIND".into(),
            value: addr.clone(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("principal_header", &self.principal_header)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[REDACTED]"))
            .field("cors_origins", &self.cors_origins)
            .field("environment", &self.environment)
            .finish()
    }
}
