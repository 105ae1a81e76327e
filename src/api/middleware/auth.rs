//! JWT authentication middleware.
//!
//! Provides middleware for validating bearer tokens, extracting the caller,
//! and restricting routes to administrators.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::AppError;
use crate::models::Role;
use crate::utils::jwt::{Claims, validate_access_token};

/// Authenticated caller, inserted into request extensions by
/// `auth_middleware` and extracted in handlers with `Extension<AuthUser>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub account_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            account_id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

/// JWT authentication middleware
///
/// # Headers
/// Expects: `Authorization: Bearer <token>`
///
/// # Errors
/// Returns 401 Unauthorized if the header is missing or malformed, or the
/// token fails validation or has expired.
///
/// # Example
/// ```ignore
/// Router::new()
///     .route("/protected", get(handler))
///     .layer(middleware::from_fn_with_state(jwt_config.clone(), auth_middleware))
/// ```
pub async fn auth_middleware(
    State(jwt): State<JwtConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing authorization header".to_string(),
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid authorization header format. Expected: Bearer <token>".to_string(),
        })?;

    let claims = validate_access_token(token, &jwt.secret)?;
    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Rejects callers without the `Admin` role. Must run after `auth_middleware`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.is_admin() => Ok(next.run(request).await),
        Some(user) => {
            tracing::debug!(account_id = %user.account_id, "Admin role required");
            Err(AppError::Forbidden {
                message: "Administrator role required".to_string(),
            })
        }
        None => Err(AppError::Unauthorized {
            message: "Authentication required".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Account;
    use crate::utils::jwt::generate_access_token;
    use axum::{Extension, Router, body::Body, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    fn jwt() -> JwtConfig {
        JwtConfig {
            secret: "test_secret_key_at_least_32_characters_long".to_string(),
            access_token_expiration: 1,
        }
    }

    fn token_for(role: Role) -> String {
        let account = Account::new(
            "Ann".to_string(),
            "ann@example.com".to_string(),
            "hash".to_string(),
            role,
        );
        generate_access_token(&account, &jwt().secret, 1).unwrap()
    }

    fn app() -> Router {
        let admin = Router::new()
            .route("/admin", get(|| async { "admin" }))
            .layer(middleware::from_fn(require_admin));
        Router::new()
            .route(
                "/me",
                get(|Extension(user): Extension<AuthUser>| async move { user.email }),
            )
            .merge(admin)
            .layer(middleware::from_fn_with_state(jwt(), auth_middleware))
    }

    async fn call(uri: &str, authorization: Option<String>) -> StatusCode {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn test_auth_user_from_claims() {
        let id = Uuid::new_v4();
        let user = AuthUser::from(Claims {
            sub: id,
            email: "ann@example.com".to_string(),
            name: "Ann".to_string(),
            role: Role::Admin,
            iat: 0,
            exp: 9_999_999_999,
        });
        assert_eq!(user.account_id, id);
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        assert_eq!(call("/me", None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_header_is_unauthorized() {
        assert_eq!(
            call("/me", Some("Basic abc".to_string())).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        let bearer = format!("Bearer {}", token_for(Role::User));
        assert_eq!(call("/me", Some(bearer)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_route_requires_admin_role() {
        let user = format!("Bearer {}", token_for(Role::User));
        let admin = format!("Bearer {}", token_for(Role::Admin));
        assert_eq!(call("/admin", Some(user)).await, StatusCode::FORBIDDEN);
        assert_eq!(call("/admin", Some(admin)).await, StatusCode::OK);
    }
}
