//! Client for the product service's owner visibility endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use uuid::Uuid;

use crate::config::InternalConfig;
use crate::error::AppResult;
use crate::external::client::build_http_client;
use crate::models::VisibilityMode;

pub const INTERNAL_API_KEY_HEADER: &str = "X-Internal-Api-Key";

/// Result of one visibility call. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityOutcome {
    Success,
    RemoteNotFound,
    RemoteError(String),
    TransportError(String),
}

impl VisibilityOutcome {
    fn from_status(status: StatusCode, body: String) -> Self {
        if status.is_success() {
            Self::Success
        } else if status == StatusCode::NOT_FOUND {
            Self::RemoteNotFound
        } else if body.is_empty() {
            Self::RemoteError(format!("status {}", status.as_u16()))
        } else {
            Self::RemoteError(format!("status {}: {}", status.as_u16(), body))
        }
    }
}

/// Asks the product service to show, hide or remove every product of an owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductVisibilityClient: Send + Sync {
    async fn set_visibility(&self, owner_id: Uuid, mode: VisibilityMode) -> VisibilityOutcome;
}

/// HTTP implementation: `PATCH {base}/api/products/owner/{id}/{mode}` with the
/// shared key header and no body.
pub struct HttpVisibilityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpVisibilityClient {
    pub fn new(config: &InternalConfig) -> AppResult<Self> {
        Ok(Self {
            http: build_http_client(Duration::from_secs(config.timeout_seconds))?,
            base_url: config.products_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, owner_id: Uuid, mode: VisibilityMode) -> String {
        format!(
            "{}/api/products/owner/{}/{}",
            self.base_url,
            owner_id,
            mode.as_str()
        )
    }
}

#[async_trait]
impl ProductVisibilityClient for HttpVisibilityClient {
    async fn set_visibility(&self, owner_id: Uuid, mode: VisibilityMode) -> VisibilityOutcome {
        let url = self.endpoint(owner_id, mode);
        let response = self
            .http
            .patch(&url)
            .header(INTERNAL_API_KEY_HEADER, &self.api_key)
            .send()
            .await;

        let outcome = match response {
            Ok(resp) => {
                let status = resp.status();
                let body = if status.is_success() {
                    String::new()
                } else {
                    resp.text().await.unwrap_or_default()
                };
                VisibilityOutcome::from_status(status, body)
            }
            Err(e) if e.is_timeout() => {
                VisibilityOutcome::TransportError(format!("timed out: {}", e))
            }
            Err(e) => VisibilityOutcome::TransportError(e.to_string()),
        };

        tracing::debug!(
            owner_id = %owner_id,
            action = %mode,
            outcome = ?outcome,
            "Product visibility call finished"
        );
        outcome
    }
}
