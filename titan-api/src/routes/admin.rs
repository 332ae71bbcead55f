//! Admin Endpoints
//!
//! - `GET /api/admin/templates` - every template with its mint progress
//! - `POST /api/admin/bind` - bind a tag to a template before its first scan
//!
//! Both require the admin bearer token. Mounted only when
//! `TITAN_ADMIN_TOKEN` is configured.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use titan_core::{
    AthleteId, BindEvidence, BindRequest, CardId, CardTemplate, CardVersion, ProofMaterial,
    TemplateId, ValidationError,
};

use super::scan::non_empty;
use crate::error::{ApiError, ApiResult};
use crate::extractors::AdminToken;
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateView {
    pub id: TemplateId,
    pub athlete_id: AthleteId,
    pub version: CardVersion,
    pub external_group_id: Option<String>,
    pub sku_code: Option<String>,
    pub edition_cap: Option<i64>,
    pub minted_count: i64,
}

impl From<CardTemplate> for TemplateView {
    fn from(t: CardTemplate) -> Self {
        Self {
            id: t.template_id,
            athlete_id: t.athlete_id,
            version: t.version,
            external_group_id: t.external_group_id,
            sku_code: t.sku_code,
            edition_cap: t.edition_cap,
            minted_count: t.minted_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateListResponse {
    pub items: Vec<TemplateView>,
}

/// Body of `POST /api/admin/bind`. Either the ETRNL proof fields or a bare
/// `uid` must be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindBody {
    pub template_id: Option<String>,
    pub tag_id: Option<String>,
    pub enc: Option<String>,
    pub e_code: Option<String>,
    pub tt: Option<String>,
    pub cmac: Option<String>,
    pub uid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindResponse {
    pub ok: bool,
    pub card_id: CardId,
    pub serial_no: i64,
}

// ============================================================================
// NORMALIZATION
// ============================================================================

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value.and_then(non_empty).ok_or_else(|| {
        ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        }
        .into()
    })
}

/// Turn a bind body into a core request.
///
/// Proof fields win over `uid` when `enc` and `eCode` are both present.
pub fn bind_request(body: BindBody) -> ApiResult<BindRequest> {
    let raw_template = required(body.template_id, "templateId")?;
    let template_id: TemplateId = raw_template.parse().map_err(|e: uuid::Error| {
        ApiError::from(ValidationError::InvalidValue {
            field: "templateId".into(),
            reason: e.to_string(),
        })
    })?;
    let tag_external_id = required(body.tag_id, "tagId")?;

    let enc = body.enc.and_then(non_empty);
    let e_code = body.e_code.and_then(non_empty);
    let tt = body.tt.and_then(non_empty);
    let cmac = body.cmac.and_then(non_empty);

    let evidence = match (enc, e_code) {
        (Some(enc), Some(e_code)) => {
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
                (None, None) => {
                    return Err(ValidationError::RequiredFieldMissing {
                        field: "tt|cmac".into(),
                    }
                    .into())
                }
            };
            BindEvidence::Proof(proof)
        }
        _ => match body.uid.and_then(non_empty) {
            Some(uid) => BindEvidence::Uid(uid),
            None => return Err(ApiError::missing_params("enc,eCode|uid")),
        },
    };

    Ok(BindRequest {
        template_id,
        tag_external_id,
        evidence,
    })
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/admin/templates
async fn list_templates(
    State(state): State<AppState>,
    _admin: AdminToken,
) -> ApiResult<Json<TemplateListResponse>> {
    let items = state
        .store
        .templates_list()
        .await?
        .into_iter()
        .map(TemplateView::from)
        .collect();
    Ok(Json(TemplateListResponse { items }))
}

/// POST /api/admin/bind
async fn bind_tag(
    State(state): State<AppState>,
    _admin: AdminToken,
    Json(body): Json<BindBody>,
) -> ApiResult<Json<BindResponse>> {
    let request = bind_request(body)?;
    let card = state.scans.bind(&request).await?;
    Ok(Json(BindResponse {
        ok: true,
        card_id: card.card_id,
        serial_no: card.serial_no,
    }))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/templates", get(list_templates))
        .route("/bind", post(bind_tag))
        .with_state(state)
}
