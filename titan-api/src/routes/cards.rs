//! Card Instance Endpoints
//!
//! Read access to a minted card, its scan history, and the claim
//! transition of the ownership state machine.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use titan_core::{CardId, CardInstance, CardStatus, MintError, PrincipalId, ScanEvent, TemplateId};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{MaybePrincipal, PathId, Principal};
use crate::state::AppState;
use crate::telemetry::metrics;

// ============================================================================
// TYPES
// ============================================================================

/// Public view of a card. The owner id itself is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub id: CardId,
    pub template_id: TemplateId,
    pub serial_no: i64,
    pub status: CardStatus,
    pub owned: bool,
    pub owned_by_me: bool,
}

impl CardView {
    pub fn new(card: &CardInstance, viewer: Option<PrincipalId>) -> Self {
        Self {
            id: card.card_id,
            template_id: card.template_id,
            serial_no: card.serial_no,
            status: card.status,
            owned: card.is_owned(),
            owned_by_me: viewer.is_some_and(|p| card.is_owned_by(p)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanHistoryResponse {
    pub card_id: CardId,
    pub scans: Vec<ScanEvent>,
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn load_card(state: &AppState, card_id: CardId) -> ApiResult<CardInstance> {
    state
        .store
        .instance_get(card_id)
        .await?
        .ok_or_else(|| MintError::CardNotFound { card_id }.into())
}

/// GET /api/cards/:id
async fn get_card(
    State(state): State<AppState>,
    PathId(card_id): PathId<CardId>,
    MaybePrincipal(viewer): MaybePrincipal,
) -> ApiResult<Json<CardView>> {
    let card = load_card(&state, card_id).await?;
    Ok(Json(CardView::new(&card, viewer)))
}

/// POST /api/cards/:id/claim
async fn claim_card(
    State(state): State<AppState>,
    PathId(card_id): PathId<CardId>,
    Principal(principal): Principal,
) -> ApiResult<Json<ClaimResponse>> {
    let result = titan_mint::claim(state.store.as_ref(), card_id, principal)
        .await
        .map_err(ApiError::from);

    if let Some(m) = metrics() {
        m.record_claim(match &result {
            Ok(_) => "ok",
            Err(e) => e.code.as_str(),
        });
    }

    result?;
    Ok(Json(ClaimResponse { ok: true }))
}

/// GET /api/cards/:id/scans
async fn card_scans(
    State(state): State<AppState>,
    PathId(card_id): PathId<CardId>,
) -> ApiResult<Json<ScanHistoryResponse>> {
    load_card(&state, card_id).await?;
    let scans = state.store.scan_events_for_card(card_id).await?;
    Ok(Json(ScanHistoryResponse { card_id, scans }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/:id", get(get_card))
        .route("/:id/claim", post(claim_card))
        .route("/:id/scans", get(card_scans))
        .with_state(state)
}
