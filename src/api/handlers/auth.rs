//! Authentication handlers: registration, login, email confirmation and
//! password reset.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use jiff::Timestamp;
use validator::Validate;

use crate::api::dto::{
    AuthResponse, ConfirmEmailQuery, ForgotPasswordRequest, LoginRequest, MessageResponse,
    RegisterRequest, ResetPasswordRequest,
};
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::models::Account;
use crate::services::Registration;
use crate::state::AccountsState;
use crate::utils::jwt::{Claims, sign_claims};
use crate::utils::validate::ValidatedJson;

/// Creates the authentication routes
///
/// # Routes
/// - `POST /register` - Create an account and email a confirmation link
/// - `POST /login` - Verify credentials and issue an access token
/// - `GET /confirm-email` - Consume a confirmation token
/// - `POST /forgot-password` - Email a password reset link
/// - `POST /reset-password` - Consume a reset token and set a new password
pub fn auth_routes() -> Router<AccountsState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/confirm-email", get(confirm_email))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Signs an access token for `account` and wraps it with the public view.
pub(crate) fn session_for(account: Account, jwt: &JwtConfig) -> AppResult<AuthResponse> {
    let claims = Claims::new(&account, jwt.access_token_expiration)?;
    let access_token = sign_claims(&claims, &jwt.secret)?;
    let expires_at = Timestamp::from_second(claims.exp).map_err(AppError::internal)?;

    Ok(AuthResponse {
        account: account.into(),
        access_token,
        token_type: "Bearer",
        expires_at,
    })
}

/// POST /api/auth/register
async fn register(
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

/// POST /api/auth/login
async fn login(
    State(state): State<AccountsState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let account = state
        .services
        .accounts
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(session_for(account, &state.jwt_config)?))
}

/// GET /api/auth/confirm-email?email=..&token=..
async fn confirm_email(
    State(state): State<AccountsState>,
    Query(query): Query<ConfirmEmailQuery>,
) -> AppResult<Json<MessageResponse>> {
    query.validate()?;
    state
        .services
        .accounts
        .confirm_email(&query.email, &query.token)
        .await?;
    Ok(Json(MessageResponse::new(
        "Your account is confirmed. You can now sign in.",
    )))
}

/// POST /api/auth/forgot-password
async fn forgot_password(
    State(state): State<AccountsState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let message = state
        .services
        .accounts
        .request_password_reset(&payload.email)
        .await?;
    Ok(Json(MessageResponse::new(message)))
}

/// POST /api/auth/reset-password
async fn reset_password(
    State(state): State<AccountsState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .accounts
        .fulfill_password_reset(&payload.email, &payload.token, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password has been reset.")))
}
