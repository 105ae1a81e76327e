//! Account administration handlers.
//!
//! Every route needs a bearer token; the mutating ones need the `Admin` role.

use axum::{
    Json, Router, middleware,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::api::dto::{AccountResponse, AuthResponse, RegisterRequest, UpdateAccountRequest};
use crate::api::handlers::auth::session_for;
use crate::api::middleware::require_admin;
use crate::error::{AppError, AppResult};
use crate::models::StatusChange;
use crate::services::Registration;
use crate::state::AccountsState;
use crate::utils::validate::ValidatedJson;

/// Creates account routes. The caller wraps them in `auth_middleware`.
///
/// Routes:
/// - GET /                  - List accounts
/// - GET /{id}              - Get an account
/// - POST /                 - Create an account (admin)
/// - PUT /{id}              - Replace name and email (admin)
/// - DELETE /{id}           - Delete account and its products (admin)
/// - PATCH /{id}/activate   - Activate and show products (admin)
/// - PATCH /{id}/deactivate - Deactivate and hide products (admin)
pub fn user_routes() -> Router<AccountsState> {
    let admin = Router::new()
        .route("/", post(create_user))
        .route("/{id}", put(update_user).delete(delete_user))
        .route("/{id}/activate", patch(activate_user))
        .route("/{id}/deactivate", patch(deactivate_user))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user))
        .merge(admin)
}

/// GET /api/users
async fn list_users(State(state): State<AccountsState>) -> AppResult<Json<Vec<AccountResponse>>> {
    let accounts = state.services.accounts.list_accounts().await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<AccountsState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.services.accounts.get_account(id).await?;
    Ok(Json(account.into()))
}

/// POST /api/users - same flow as self-registration, including the email
async fn create_user(
    State(state): State<AccountsState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let account = state
        .services
        .accounts
        .register(Registration {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            role: payload.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(session_for(account, &state.jwt_config)?)))
}

/// PUT /api/users/{id}
async fn update_user(
    State(state): State<AccountsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateAccountRequest>,
) -> AppResult<Json<AccountResponse>> {
    let account = state
        .services
        .accounts
        .update_account(id, payload.into())
        .await?;
    Ok(Json(account.into()))
}

/// DELETE /api/users/{id}
///
/// 204 when deleted, 404 when the account does not exist, 502 when the
/// product service refused and the account was kept.
async fn delete_user(
    State(state): State<AccountsState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let accounts = &state.services.accounts;
    if accounts.delete_account(id).await? {
        return Ok(StatusCode::NO_CONTENT);
    }

    // Distinguish a missing account from a refused product removal.
    accounts.get_account(id).await?;
    Err(AppError::Remote {
        status: StatusCode::BAD_GATEWAY.as_u16(),
        detail: "product removal failed; account kept".to_string(),
    })
}

async fn change_status(
    state: &AccountsState,
    id: Uuid,
    target: StatusChange,
) -> AppResult<StatusCode> {
    if state.services.accounts.change_status(id, target).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::account_not_found(id))
    }
}

/// PATCH /api/users/{id}/activate
async fn activate_user(
    State(state): State<AccountsState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    change_status(&state, id, StatusChange::Activate).await
}

/// PATCH /api/users/{id}/deactivate
async fn deactivate_user(
    State(state): State<AccountsState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    change_status(&state, id, StatusChange::Deactivate).await
}
