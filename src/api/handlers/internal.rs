//! Service-to-service endpoint that applies an account's status to all of
//! its products.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    routing::patch,
};
use uuid::Uuid;

use crate::api::dto::VisibilityResponse;
use crate::error::{AppError, AppResult};
use crate::external::INTERNAL_API_KEY_HEADER;
use crate::models::VisibilityMode;
use crate::state::ProductsState;

/// `PATCH /owner/{owner_id}/{show|hide|remove}`, nested under `/api/products`.
pub fn internal_routes() -> Router<ProductsState> {
    Router::new().route("/owner/{owner_id}/{action}", patch(apply_owner_visibility))
}

async fn apply_owner_visibility(
    State(state): State<ProductsState>,
    Path((owner_id, action)): Path<(String, String)>,
    headers: HeaderMap,
) -> AppResult<Json<VisibilityResponse>> {
    let credential = headers
        .get(INTERNAL_API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    state.services.gate.authorize(credential)?;

    let owner_id = Uuid::parse_str(&owner_id).map_err(|_| AppError::BadRequest {
        message: format!("Invalid owner id '{}'", owner_id),
    })?;
    let mode: VisibilityMode = action.parse()?;
    let affected = state
        .services
        .gate
        .apply_visibility(credential, owner_id, mode)
        .await?;

    Ok(Json(VisibilityResponse {
        owner_id,
        action: mode.to_string(),
        affected,
    }))
}
