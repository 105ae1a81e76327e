//! Router configuration for both service roles.
//!
//! # Middleware Order
//! Layers run in reverse order of declaration (last added runs first):
//! 1. Request ID middleware - generates or propagates request IDs
//! 2. Logging middleware - logs requests inside a span carrying the ID
//! 3. Global error handler - normalizes error bodies to `ErrorResponse`

use axum::{Router, middleware};

use crate::api::handlers;
use crate::api::middleware::{
    auth_middleware, global_error_handler, logging_middleware, request_id_middleware,
};
use crate::state::{AccountsState, ProductsState};

fn with_common_layers(router: Router) -> Router {
    router
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
}

/// Router of the accounts service.
///
/// # Routes
/// - `/api/auth/*` - registration, login, confirmation, password reset
/// - `/api/users/*` - account administration (bearer token)
/// - `/health`
pub fn accounts_router(state: AccountsState) -> Router {
    let users = handlers::users::user_routes().route_layer(middleware::from_fn_with_state(
        state.jwt_config.clone(),
        auth_middleware,
    ));

    let api = Router::new()
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/users", users);

    let router = Router::new()
        .nest("/api", api)
        .merge(handlers::health::health_routes("accounts"))
        .with_state(state);

    with_common_layers(router)
}

/// Router of the products service.
///
/// # Routes
/// - `/api/products/{id}` - catalog (writes need a bearer token)
/// - `/api/products/owner/{owner_id}/{action}` - visibility gate (internal API key)
/// - `/health`
pub fn products_router(state: ProductsState) -> Router {
    let products = handlers::products::product_routes(&state)
        .merge(handlers::internal::internal_routes());

    let router = Router::new()
        .nest("/api/products", products)
        .merge(handlers::health::health_routes("products"))
        .with_state(state);

    with_common_layers(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::external::{ProductVisibilityClient, VisibilityOutcome};
    use crate::models::{Account, NewProduct, Product, Role, VisibilityMode};
    use crate::repositories::{AccountStore, ProductStore, Repositories};
    use crate::services::notifications::{DeliveryOutcome, EmailMessage, Notifier};
    use crate::services::{AccountServices, ProductServices};
    use crate::utils::jwt::generate_access_token;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use bigdecimal::BigDecimal;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;
    use uuid::Uuid;

    const API_KEY: &str = "internal-test-key";

    fn jwt() -> JwtConfig {
        JwtConfig {
            secret: "test_secret_key_at_least_32_characters_long".to_string(),
            access_token_expiration: 1,
        }
    }

    #[derive(Default)]
    struct Outbox(Mutex<Vec<EmailMessage>>);

    #[async_trait]
    impl Notifier for Outbox {
        async fn send(&self, message: &EmailMessage) -> DeliveryOutcome {
            self.0.lock().unwrap().push(message.clone());
            DeliveryOutcome::Delivered
        }

        fn name(&self) -> &'static str {
            "outbox"
        }
    }

    /// Forwards visibility calls to the products router in-process.
    struct RouterVisibility(Router);

    #[async_trait]
    impl ProductVisibilityClient for RouterVisibility {
        async fn set_visibility(&self, owner_id: Uuid, mode: VisibilityMode) -> VisibilityOutcome {
            let request = Request::builder()
                .method(Method::PATCH)
                .uri(format!("/api/products/owner/{}/{}", owner_id, mode))
                .header("X-Internal-Api-Key", API_KEY)
                .body(Body::empty())
                .unwrap();
            match self.0.clone().oneshot(request).await {
                Ok(r) if r.status().is_success() => VisibilityOutcome::Success,
                Ok(r) if r.status() == StatusCode::NOT_FOUND => VisibilityOutcome::RemoteNotFound,
                Ok(r) => VisibilityOutcome::RemoteError(r.status().to_string()),
                Err(e) => VisibilityOutcome::TransportError(e.to_string()),
            }
        }
    }

    struct System {
        accounts: Router,
        products: Router,
        repos: Repositories,
        outbox: Arc<Outbox>,
    }

    fn system() -> System {
        let repos = Repositories::in_memory();
        let products = products_router(ProductsState::new(
            ProductServices::new(&repos, API_KEY),
            jwt(),
        ));
        let outbox = Arc::new(Outbox::default());
        let services = AccountServices::new(
            &repos,
            outbox.clone(),
            Arc::new(RouterVisibility(products.clone())),
            "http://accounts.test",
        );
        let accounts = accounts_router(AccountsState::new(services, jwt()));
        System {
            accounts,
            products,
            repos,
            outbox,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn seed_admin(repos: &Repositories) -> String {
        let mut admin = Account::new(
            "Root".to_string(),
            "root@example.com".to_string(),
            "unused".to_string(),
            Role::Admin,
        );
        admin.email_confirmed = true;
        let admin = repos.accounts.create(&admin).await.unwrap();
        generate_access_token(&admin, &jwt().secret, 1).unwrap()
    }

    #[tokio::test]
    async fn test_register_confirm_login_over_http() {
        let sys = system();
        let (status, body) = send(
            &sys.accounts,
            json_request(
                Method::POST,
                "/api/auth/register",
                serde_json::json!({"name": "Ann", "email": "ann@example.com", "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["access_token"].is_string());
        assert!(!body.to_string().contains("email_confirmation"));

        let link = {
            let sent = sys.outbox.0.lock().unwrap();
            let html = &sent[0].html_body;
            let start = html.find("/api/auth/confirm-email").unwrap();
            let end = html[start..].find('"').unwrap() + start;
            html[start..end].to_string()
        };
        let (status, _) = send(
            &sys.accounts,
            Request::builder().uri(&link).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &sys.accounts,
            json_request(
                Method::POST,
                "/api/auth/login",
                serde_json::json!({"email": "ann@example.com", "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["account"]["email_confirmed"], true);
        assert_eq!(body["token_type"], "Bearer");
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected_before_mutation() {
        let sys = system();
        let (status, body) = send(
            &sys.accounts,
            json_request(
                Method::POST,
                "/api/auth/register",
                serde_json::json!({"name": "", "email": "nope", "password": "1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(sys.repos.accounts.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_deactivation_hides_products_end_to_end() {
        let sys = system();
        let admin_token = seed_admin(&sys.repos).await;
        let owner = sys
            .repos
            .accounts
            .create(&Account::new(
                "Ann".to_string(),
                "ann@example.com".to_string(),
                "unused".to_string(),
                Role::User,
            ))
            .await
            .unwrap();
        let product = sys
            .repos
            .products
            .create(&Product::create(NewProduct {
                owner_id: owner.id,
                name: "Lamp".to_string(),
                description: None,
                price: BigDecimal::from(5),
                is_available: true,
            }))
            .await
            .unwrap();

        let deactivate = Request::builder()
            .method(Method::PATCH)
            .uri(format!("/api/users/{}/deactivate", owner.id))
            .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&sys.accounts, deactivate).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &sys.products,
            Request::builder()
                .uri(format!("/api/products/{}", product.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_deactivate() {
        let sys = system();
        let user = sys
            .repos
            .accounts
            .create(&Account::new(
                "Ann".to_string(),
                "ann@example.com".to_string(),
                "unused".to_string(),
                Role::User,
            ))
            .await
            .unwrap();
        let token = generate_access_token(&user, &jwt().secret, 1).unwrap();

        let (status, body) = send(
            &sys.accounts,
            Request::builder()
                .method(Method::PATCH)
                .uri(format!("/api/users/{}/deactivate", user.id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_visibility_gate_requires_key() {
        let sys = system();
        let (status, _) = send(
            &sys.products,
            Request::builder()
                .method(Method::PATCH)
                .uri(format!("/api/products/owner/{}/hide", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_visibility_gate_checks_key_before_owner_id() {
        let sys = system();
        let (status, _) = send(
            &sys.products,
            Request::builder()
                .method(Method::PATCH)
                .uri("/api/products/owner/not-a-uuid/hide")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &sys.products,
            Request::builder()
                .method(Method::PATCH)
                .uri("/api/products/owner/not-a-uuid/hide")
                .header("X-Internal-Api-Key", API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_visibility_gate_rejects_unknown_action() {
        let sys = system();
        let (status, _) = send(
            &sys.products,
            Request::builder()
                .method(Method::PATCH)
                .uri(format!("/api/products/owner/{}/explode", Uuid::new_v4()))
                .header("X-Internal-Api-Key", API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_owner_creates_product_and_stranger_cannot_delete() {
        let sys = system();
        let owner = Account::new(
            "Ann".to_string(),
            "ann@example.com".to_string(),
            "unused".to_string(),
            Role::User,
        );
        let stranger = Account::new(
            "Bob".to_string(),
            "bob@example.com".to_string(),
            "unused".to_string(),
            Role::User,
        );
        let owner_token = generate_access_token(&owner, &jwt().secret, 1).unwrap();
        let stranger_token = generate_access_token(&stranger, &jwt().secret, 1).unwrap();

        let mut create = json_request(
            Method::POST,
            "/api/products",
            serde_json::json!({"name": "Lamp", "price": "12.50"}),
        );
        create.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {}", owner_token).parse().unwrap(),
        );
        let (status, body) = send(&sys.products, create).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &sys.products,
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/products/{}", id))
                .header(header::AUTHORIZATION, format!("Bearer {}", stranger_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
