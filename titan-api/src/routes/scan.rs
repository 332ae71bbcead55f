//! ETRNL Scan Endpoints
//!
//! - `GET /api/scan/resolve` - everything in the query string
//! - `GET /api/scan/:template/:tag_id` - template hint and tag id in the path
//!
//! Scanner firmware in the field uses several spellings for each parameter;
//! they are normalized here before the request reaches the minting core.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use titan_core::{
    CardId, ClientMeta, OracleProvider, ProofMaterial, ScanOutcome, ScanRequest, ScanState,
    ValidationError,
};

use crate::error::{ApiError, ApiResult};
use crate::extractors::ClientInfo;
use crate::state::AppState;
use crate::telemetry::metrics;

/// Accepted spellings of the template hint, in priority order.
pub(crate) const TEMPLATE_HINT_PARAMS: &[&str] = &["t", "template", "templateId"];

// ============================================================================
// TYPES
// ============================================================================

/// Body of a successful scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub ok: bool,
    pub authentic: bool,
    pub state: ScanState,
    pub card_id: CardId,
    pub minted: bool,
    pub serial_no: i64,
    pub provider: OracleProvider,
}

impl ScanResponse {
    pub fn new(provider: OracleProvider, outcome: &ScanOutcome) -> Self {
        Self {
            ok: true,
            authentic: outcome.authentic,
            state: outcome.state,
            card_id: outcome.card_id,
            minted: outcome.minted,
            serial_no: outcome.serial_no,
            provider,
        }
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// First non-empty value among `names`.
pub(crate) fn param(query: &HashMap<String, String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| query.get(*name))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Build an ETRNL scan request. Path values win over query values.
///
/// Exactly one of `tt` (tamper-token mode) or `cmac` (MAC mode) must be
/// present; supplying both is rejected rather than guessed.
pub fn etrnl_request(
    path: Option<(String, String)>,
    query: &HashMap<String, String>,
    client: ClientMeta,
) -> ApiResult<ScanRequest> {
    let (path_template, path_tag) = match path {
        Some((template, tag_id)) => (non_empty(template), non_empty(tag_id)),
        None => (None, None),
    };

    let tag_id = path_tag.or_else(|| param(query, &["tagId", "tid"]));
    let enc = param(query, &["enc", "e"]);
    let e_code = param(query, &["eCode", "de"]);
    let tt = param(query, &["tt"]);
    let cmac = param(query, &["cmac", "c"]);
    let template_hint = path_template.or_else(|| param(query, TEMPLATE_HINT_PARAMS));

    let mut need = Vec::new();
    if tag_id.is_none() {
        need.push("tagId");
    }
    if enc.is_none() {
        need.push("enc");
    }
    if e_code.is_none() {
        need.push("eCode");
    }
    if tt.is_none() && cmac.is_none() {
        need.push("tt|cmac");
    }

    let (Some(tag_id), Some(enc), Some(e_code)) = (tag_id, enc, e_code) else {
        return Err(ApiError::missing_params(&need.join(",")));
    };

    let proof = match (tt, cmac) {
        (Some(tamper_token), None) => ProofMaterial::TamperToken {
            enc,
            e_code,
            tamper_token,
        },
        (None, Some(cmac)) => ProofMaterial::Mac { enc, e_code, cmac },
        (Some(_), Some(_)) => {
            return Err(ValidationError::ConflictingFields {
                fields: vec!["tt".into(), "cmac".into()],
            }
            .into())
        }
        (None, None) => return Err(ApiError::missing_params(&need.join(","))),
    };

    Ok(ScanRequest {
        provider: OracleProvider::Etrnl,
        tag_external_id: tag_id,
        proof,
        template_hint,
        client,
    })
}

/// Run a normalized request through the minting core and shape the reply.
pub(crate) async fn run_scan(state: &AppState, request: ScanRequest) -> ApiResult<Json<ScanResponse>> {
    let provider = request.provider;
    let result = state.scans.scan(&request).await.map_err(ApiError::from);

    if let Some(m) = metrics() {
        let outcome = match &result {
            Ok(o) if o.minted => "minted",
            Ok(_) => "repeat",
            Err(e) => e.code.as_str(),
        };
        m.record_scan(provider, outcome);
    }

    let outcome = result?;
    Ok(Json(ScanResponse::new(provider, &outcome)))
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/scan/resolve
async fn resolve_scan(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ScanResponse>> {
    let request = etrnl_request(None, &query, client)?;
    run_scan(&state, request).await
}

/// GET /api/scan/:template/:tag_id
async fn scan_with_path(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
    ClientInfo(client): ClientInfo,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ScanResponse>> {
    let request = etrnl_request(Some(path), &query, client)?;
    run_scan(&state, request).await
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/resolve", get(resolve_scan))
        .route("/:template/:tag_id", get(scan_with_path))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_short_aliases_normalize() {
        let q = query(&[("tid", "TAG-1"), ("e", "ENC"), ("de", "00"), ("c", "MAC"), ("template", "SKU-9")]);
        let request = etrnl_request(None, &q, ClientMeta::default()).unwrap();
        assert_eq!(request.tag_external_id, "TAG-1");
        assert_eq!(request.template_hint.as_deref(), Some("SKU-9"));
        assert_eq!(
            request.proof,
            ProofMaterial::Mac {
                enc: "ENC".into(),
                e_code: "00".into(),
                cmac: "MAC".into()
            }
        );
    }

    #[test]
    fn test_path_values_win() {
        let q = query(&[("tagId", "FROM-QUERY"), ("t", "query-hint"), ("enc", "x"), ("eCode", "y"), ("tt", "z")]);
        let request = etrnl_request(
            Some(("path-hint".into(), "FROM-PATH".into())),
            &q,
            ClientMeta::default(),
        )
        .unwrap();
        assert_eq!(request.tag_external_id, "FROM-PATH");
        assert_eq!(request.template_hint.as_deref(), Some("path-hint"));
        assert_eq!(request.proof.mode(), "tamper_token");
    }

    #[test]
    fn test_missing_params_are_listed() {
        let q = query(&[("tagId", "TAG-1"), ("enc", "  ")]);
        let err = etrnl_request(None, &q, ClientMeta::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParams);
        assert_eq!(
            err.details,
            Some(serde_json::json!({ "need": "enc,eCode,tt|cmac" }))
        );
    }

    #[test]
    fn test_both_proof_modes_rejected() {
        let q = query(&[("tagId", "T"), ("enc", "x"), ("eCode", "y"), ("tt", "a"), ("cmac", "b")]);
        let err = etrnl_request(None, &q, ClientMeta::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParams);
        assert_eq!(err.details, Some(serde_json::json!({ "need": "tt|cmac" })));
    }

    #[test]
    fn test_hint_is_optional() {
        let q = query(&[("tagId", "T"), ("enc", "x"), ("eCode", "y"), ("tt", "a")]);
        let request = etrnl_request(None, &q, ClientMeta::default()).unwrap();
        assert!(request.template_hint.is_none());
    }
}
