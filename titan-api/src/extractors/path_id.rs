//! Typed path extractor for entity IDs.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use titan_core::EntityIdType;
use uuid::Uuid;

use crate::error::ApiError;

/// Extracts a single UUID path parameter into a typed id.
///
/// ```rust,ignore
/// async fn get_card(PathId(card_id): PathId<CardId>) -> ApiResult<Json<CardView>> { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathId<T: EntityIdType>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathId<T>
where
    S: Send + Sync,
    T: EntityIdType + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(uuid): Path<Uuid> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_input(format!("Invalid id in path: {}", e)))?;
        Ok(PathId(T::new(uuid)))
    }
}
