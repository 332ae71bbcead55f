//! Caller identity extractors.
//!
//! Session handling lives in front of this service. It authenticates the
//! user and forwards the principal id in a trusted header (see
//! [`ApiConfig::principal_header`]); these extractors only read it back.
//!
//! Nothing here verifies that header. The session layer must strip any
//! client-supplied copy and set its own on every request it forwards, and
//! this service must not be reachable except through it. Otherwise any
//! client can claim cards in anyone's name by sending the header itself.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use subtle::ConstantTimeEq;
use titan_core::PrincipalId;

use crate::config::ApiConfig;
use crate::error::ApiError;

/// The authenticated principal. Rejects with `unauthorized` when the header
/// is absent or not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal(pub PrincipalId);

/// The principal when one is present and well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaybePrincipal(pub Option<PrincipalId>);

fn principal_from_parts(parts: &Parts, config: &ApiConfig) -> Result<PrincipalId, ApiError> {
    let raw = parts
        .headers
        .get(&config.principal_header)
        .ok_or_else(|| ApiError::unauthorized("Sign in required"))?;
    let raw = raw
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid principal id"))?;
    PrincipalId::from_str(raw.trim()).map_err(|_| ApiError::unauthorized("Invalid principal id"))
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    Arc<ApiConfig>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<ApiConfig>::from_ref(state);
        principal_from_parts(parts, &config).map(Principal)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybePrincipal
where
    S: Send + Sync,
    Arc<ApiConfig>: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<ApiConfig>::from_ref(state);
        Ok(MaybePrincipal(principal_from_parts(parts, &config).ok()))
    }
}

/// Proof that the request carries the configured admin bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AdminToken;

#[async_trait]
impl<S> FromRequestParts<S> for AdminToken
where
    S: Send + Sync,
    Arc<ApiConfig>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<ApiConfig>::from_ref(state);
        let expected = config
            .admin_token
            .as_deref()
            .ok_or_else(|| ApiError::forbidden("Admin access is disabled"))?;

        let presented = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        if token_matches(presented, expected) {
            Ok(AdminToken)
        } else {
            tracing::warn!("Rejected admin request with a wrong token");
            Err(ApiError::forbidden("Invalid admin token"))
        }
    }
}

fn token_matches(presented: &str, expected: &str) -> bool {
    bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}
