//! Catalog handlers of the products service.

use axum::{
    Extension, Json, Router, middleware,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::api::dto::{CreateProductRequest, ProductResponse, UpdateProductRequest};
use crate::api::middleware::{AuthUser, auth_middleware};
use crate::error::{AppError, AppResult};
use crate::state::ProductsState;
use crate::utils::validate::ValidatedJson;

/// Creates product routes.
///
/// Routes:
/// - GET /{id}    - Get a visible product (public)
/// - POST /       - Create a product owned by the caller
/// - PUT /{id}    - Update the caller's product
/// - DELETE /{id} - Delete the caller's product
pub fn product_routes(state: &ProductsState) -> Router<ProductsState> {
    let owner = Router::new()
        .route("/", post(create_product))
        .route("/{id}", put(update_product).delete(delete_product))
        .route_layer(middleware::from_fn_with_state(
            state.jwt_config.clone(),
            auth_middleware,
        ));

    Router::new().route("/{id}", get(get_product)).merge(owner)
}

/// GET /api/products/{id}
async fn get_product(
    State(state): State<ProductsState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductResponse>> {
    let product = state.services.catalog.get_product(id).await?;
    Ok(Json(product.into()))
}

/// POST /api/products
async fn create_product(
    State(state): State<ProductsState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    let product = state
        .services
        .catalog
        .create_product(payload.into_new_product(user.account_id))
        .await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /api/products/{id}
async fn update_product(
    State(state): State<ProductsState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<ProductResponse>> {
    let product = state
        .services
        .catalog
        .update_product(user.account_id, id, payload.into())
        .await?;
    Ok(Json(product.into()))
}

/// DELETE /api/products/{id}
async fn delete_product(
    State(state): State<ProductsState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state
        .services
        .catalog
        .delete_product(user.account_id, id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::product_not_found(id))
    }
}
