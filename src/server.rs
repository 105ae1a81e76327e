//! Server module for managing HTTP server lifecycle
//!
//! This module handles store selection, router assembly for the chosen
//! service role, startup, and graceful shutdown.

use std::fmt;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, Method, header};
use clap::ValueEnum;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::api::middleware::REQUEST_ID_HEADER;
use crate::api::routes::{accounts_router, products_router};
use crate::config::{EmailTransport, Environment, Settings, StoreBackend};
use crate::db::{establish_async_connection_pool, run_migrations};
use crate::error::AppResult;
use crate::repositories::Repositories;
use crate::services::{AccountServices, ProductServices};
use crate::state::{AccountsState, ProductsState};

/// Which of the two services this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceRole {
    /// Account lifecycle: registration, login, tokens, administration
    Accounts,
    /// Product catalog and the owner visibility gate
    Products,
}

impl ServiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRole::Accounts => "accounts",
            ServiceRole::Products => "products",
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP server manager
pub struct Server {
    settings: Settings,
    role: ServiceRole,
}

impl Server {
    /// Create a new server for `role` with the given settings
    pub fn new(settings: Settings, role: ServiceRole) -> Self {
        Self { settings, role }
    }

    /// Start the server and run until a shutdown signal arrives
    ///
    /// # Errors
    /// - Store initialization or migration errors
    /// - Notifier or HTTP client construction errors
    /// - Address binding errors
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env(),
            role = %self.role,
            "Application starting"
        );

        tracing::info!(
            host = %self.settings.server.host,
            port = self.settings.server.port,
            request_timeout = self.settings.server.request_timeout,
            keep_alive_timeout = self.settings.server.keep_alive_timeout,
            "Server configuration loaded"
        );

        tracing::info!(
            backend = ?self.settings.database.backend,
            max_connections = self.settings.database.max_connections,
            auto_migrate = self.settings.database.auto_migrate,
            "Database configuration loaded"
        );

        tracing::info!(
            access_token_expiration = self.settings.jwt.access_token_expiration,
            secret_configured = !self.settings.jwt.secret.is_empty(),
            "JWT configuration loaded"
        );

        if Environment::from_env().is_production() {
            self.warn_on_development_settings();
        }

        let repos = self.open_stores().await?;
        let router = self.build_router(&repos)?;
        tracing::info!(role = %self.role, "Router configured");

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, role = %self.role, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    fn warn_on_development_settings(&self) {
        if self.settings.database.backend == StoreBackend::Memory {
            tracing::warn!("Memory backend selected in production");
        }
        if self.role == ServiceRole::Accounts
            && self.settings.email.transport == EmailTransport::Log
        {
            tracing::warn!(
                "Log email transport selected in production; no email will be delivered"
            );
        }
    }

    async fn open_stores(&self) -> AppResult<Repositories> {
        match self.settings.database.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores; data is lost on restart");
                Ok(Repositories::in_memory())
            }
            StoreBackend::Postgres => {
                if self.settings.database.auto_migrate {
                    let applied = run_migrations(&self.settings.database.url).await?;
                    tracing::info!(
                        count = applied.len(),
                        migrations = ?applied,
                        "Migrations applied"
                    );
                }

                tracing::info!("Initializing database connection pool...");
                let pool = establish_async_connection_pool(&self.settings.database).await?;
                tracing::info!("Database connection pool initialized");
                Ok(Repositories::postgres(pool))
            }
        }
    }

    /// Assembles the role's router with the server-wide layers.
    pub fn build_router(&self, repos: &Repositories) -> AppResult<Router> {
        let router = match self.role {
            ServiceRole::Accounts => {
                let services = AccountServices::from_settings(repos, &self.settings)?;
                accounts_router(AccountsState::new(services, self.settings.jwt.clone()))
            }
            ServiceRole::Products => {
                let services = ProductServices::new(repos, &self.settings.internal.api_key);
                products_router(ProductsState::new(services, self.settings.jwt.clone()))
            }
        };

        Ok(router
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.settings.server.request_timeout,
            )))
            .layer(cors_layer()))
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(3600))
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, EmailConfig, InternalConfig, JwtConfig};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn memory_settings() -> Settings {
        Settings {
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                ..Default::default()
            },
            jwt: JwtConfig {
                secret: "s".repeat(32),
                ..Default::default()
            },
            email: EmailConfig {
                transport: EmailTransport::Log,
                ..Default::default()
            },
            internal: InternalConfig {
                api_key: "internal-key".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_role_names() {
        assert_eq!(ServiceRole::Accounts.to_string(), "accounts");
        assert_eq!(
            ServiceRole::from_str("products", true).unwrap(),
            ServiceRole::Products
        );
    }

    #[tokio::test]
    async fn test_memory_backend_serves_health_for_each_role() {
        for role in [ServiceRole::Accounts, ServiceRole::Products] {
            let server = Server::new(memory_settings(), role);
            let repos = server.open_stores().await.unwrap();
            let router = server.build_router(&repos).unwrap();

            let response = router
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(json["service"], role.as_str());
        }
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_request_id_header() {
        let server = Server::new(memory_settings(), ServiceRole::Products);
        let router = server.build_router(&Repositories::in_memory()).unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/products/00000000-0000-0000-0000-000000000000")
                    .header(header::ORIGIN, "http://shop.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, REQUEST_ID_HEADER)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}
