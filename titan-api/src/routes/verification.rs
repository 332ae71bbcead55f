//! Titan NFC Verification Endpoints
//!
//! - `GET /api/verification/verify`
//! - `GET /api/verification/verify/:template/:tag_id`
//! - `GET /api/verification/scan/:template/:tag_id` (older printed URLs)

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use titan_core::{ClientMeta, OracleProvider, ProofMaterial, ScanRequest};

use super::scan::{non_empty, param, run_scan, ScanResponse, TEMPLATE_HINT_PARAMS};
use crate::error::{ApiError, ApiResult};
use crate::extractors::ClientInfo;
use crate::state::AppState;

/// Build a Titan NFC scan request carrying the sealed payload.
pub fn titan_nfc_request(
    path: Option<(String, String)>,
    query: &HashMap<String, String>,
    client: ClientMeta,
) -> ApiResult<ScanRequest> {
    let (path_template, path_tag) = match path {
        Some((template, tag_id)) => (non_empty(template), non_empty(tag_id)),
        None => (None, None),
    };

    let tag_id = path_tag.or_else(|| param(query, &["tagId", "tid", "id"]));
    let data = param(query, &["data", "enc", "encrypted"]);
    let template_hint = path_template.or_else(|| param(query, TEMPLATE_HINT_PARAMS));

    match (tag_id, data) {
        (Some(tag_id), Some(data)) => Ok(ScanRequest {
            provider: OracleProvider::TitanNfc,
            tag_external_id: tag_id,
            proof: ProofMaterial::Sealed { data },
            template_hint,
            client,
        }),
        (tag_id, data) => {
            let need: Vec<&str> = [("tagId", tag_id.is_none()), ("data", data.is_none())]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();
            Err(ApiError::missing_params(&need.join(",")))
        }
    }
}

async fn verify(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ScanResponse>> {
    let request = titan_nfc_request(None, &query, client)?;
    run_scan(&state, request).await
}

async fn verify_with_path(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
    ClientInfo(client): ClientInfo,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ScanResponse>> {
    let request = titan_nfc_request(Some(path), &query, client)?;
    run_scan(&state, request).await
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/verify", get(verify))
        .route("/verify/:template/:tag_id", get(verify_with_path))
        .route("/scan/:template/:tag_id", get(verify_with_path))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_payload_aliases() {
        for key in ["data", "enc", "encrypted"] {
            let query: HashMap<String, String> =
                [("id".to_string(), "NFC-7".to_string()), (key.to_string(), "CAFE".to_string())]
                    .into_iter()
                    .collect();
            let request = titan_nfc_request(None, &query, ClientMeta::default()).unwrap();
            assert_eq!(request.tag_external_id, "NFC-7");
            assert_eq!(request.proof, ProofMaterial::Sealed { data: "CAFE".into() });
            assert_eq!(request.provider, OracleProvider::TitanNfc);
        }
    }

    #[test]
    fn test_missing_payload() {
        let err = titan_nfc_request(
            Some(("tmpl".into(), "NFC-7".into())),
            &HashMap::new(),
            ClientMeta::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParams);
        assert_eq!(err.details, Some(serde_json::json!({ "need": "data" })));
    }
}
