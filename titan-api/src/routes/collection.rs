//! Collection Endpoint
//!
//! `GET /api/collection` lists the cards owned by the calling principal,
//! newest first.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::cards::CardView;
use crate::error::ApiResult;
use crate::extractors::Principal;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResponse {
    pub items: Vec<CardView>,
}

/// GET /api/collection
async fn my_collection(
    State(state): State<AppState>,
    Principal(owner): Principal,
) -> ApiResult<Json<CollectionResponse>> {
    let items = state
        .store
        .instances_for_owner(owner)
        .await?
        .iter()
        .map(|card| CardView::new(card, Some(owner)))
        .collect();
    Ok(Json(CollectionResponse { items }))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(my_collection))
        .with_state(state)
}
