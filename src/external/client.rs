use std::time::Duration;

use crate::error::{AppError, AppResult};

/// User-Agent sent on every service-to-service request.
pub const USER_AGENT: &str = concat!("account-sync/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client for outbound calls to the product service.
///
/// # Features
/// - **Timeouts**: `timeout` bounds the whole request, connecting is capped at the same value
/// - **Connection pooling**: idle connections are reused between calls
/// - **No redirects**: internal endpoints never redirect
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::Configuration {
            key: "internal".to_string(),
            source: anyhow::Error::from(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_initialization() {
        assert!(build_http_client(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_user_agent_names_the_package() {
        assert!(USER_AGENT.starts_with("account-sync/"));
    }
}
