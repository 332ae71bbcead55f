//! Fulfillment Endpoints
//!
//! Called by the order-fulfillment system with the admin bearer token.
//! Mounted only when `TITAN_ADMIN_TOKEN` is configured.

use axum::{extract::State, routing::post, Json, Router};

use titan_core::CardId;

use super::cards::CardView;
use crate::error::ApiResult;
use crate::extractors::{AdminToken, PathId};
use crate::state::AppState;

/// POST /api/fulfillment/cards/:id/ship
async fn ship_card(
    State(state): State<AppState>,
    _admin: AdminToken,
    PathId(card_id): PathId<CardId>,
) -> ApiResult<Json<CardView>> {
    let card = titan_mint::mark_shipped(state.store.as_ref(), card_id).await?;
    Ok(Json(CardView::new(&card, card.owner_principal_id)))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/cards/:id/ship", post(ship_card))
        .with_state(state)
}
