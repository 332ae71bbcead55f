//! Caller network metadata recorded on every accepted scan.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use titan_core::ClientMeta;

/// Remote address and user agent of the caller.
///
/// The address is the first `X-Forwarded-For` hop when present (the service
/// runs behind a proxy), otherwise the socket peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo(pub ClientMeta);

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(ClientInfo(client_meta(&parts.headers, peer)))
    }
}

fn client_meta(headers: &HeaderMap, peer: Option<String>) -> ClientMeta {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    ClientMeta::new(forwarded.or(peer), user_agent)
}
