//! Liveness endpoint shared by both service roles.

use axum::{Json, Router, routing::get};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: Timestamp,
}

/// `GET /health` reporting which role answered.
pub fn health_routes<S>(service: &'static str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/health",
        get(move || async move {
            Json(HealthResponse {
                status: "healthy".to_string(),
                service: service.to_string(),
                version: crate::pkg_version().to_string(),
                timestamp: Timestamp::now(),
            })
        }),
    )
}
