//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use reqwest::Url;

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, EmailConfig, EmailTransport, InternalConfig, JwtConfig, ServerConfig,
    Settings, StoreBackend,
};

/// Minimum JWT secret length
const MIN_JWT_SECRET_LEN: usize = 32;

fn validate_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ConfigError::ValidationError {
            field: field.to_string(),
            message: format!("'{}' is not a valid http(s) base URL.", value),
        }),
    }
}

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    /// - Keep-alive timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.keep_alive_timeout == 0 {
            return Err(ConfigError::validation(
                "server.keep_alive_timeout",
                "Keep-alive timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// The memory backend ignores every connection setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StoreBackend::Memory {
            return Ok(());
        }

        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !(self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")) {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }
}

impl JwtConfig {
    /// Validates the JWT configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::ValidationError {
                field: "jwt.secret".to_string(),
                message: format!(
                    "JWT secret should be at least {} characters for security",
                    MIN_JWT_SECRET_LEN
                ),
            });
        }

        if self.access_token_expiration <= 0 {
            return Err(ConfigError::validation(
                "jwt.access_token_expiration",
                "Access token expiration must be positive",
            ));
        }

        Ok(())
    }
}

impl EmailConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport == EmailTransport::Smtp && self.smtp_host.trim().is_empty() {
            return Err(ConfigError::validation(
                "email.smtp_host",
                "SMTP host is required when the smtp transport is selected.",
            ));
        }

        if self.sender.trim().is_empty() {
            return Err(ConfigError::validation(
                "email.sender",
                "Sender address cannot be empty.",
            ));
        }

        validate_base_url("email.public_base_url", &self.public_base_url)
    }
}

impl InternalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::validation(
                "internal.api_key",
                "Internal API key cannot be empty.",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "internal.timeout_seconds",
                "Internal request timeout must be greater than 0 seconds.",
            ));
        }

        validate_base_url("internal.products_base_url", &self.products_base_url)
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// This method validates all sub-configurations and returns the first
    /// validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.jwt.validate()?;
        self.logger
            .validate()
            .map_err(|e| ConfigError::validation("logger".to_string(), e.to_string()))?;
        self.email.validate()?;
        self.internal.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_settings() -> Settings {
        Settings {
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                ..Default::default()
            },
            jwt: JwtConfig {
                secret: "a".repeat(32),
                ..Default::default()
            },
            internal: InternalConfig {
                api_key: "shared-secret".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_server_config_invalid_port_zero() {
        let mut settings = valid_settings();
        settings.server.port = 0;
        assert_eq!(field_of(settings.validate().unwrap_err()), "server.port");
    }

    #[test]
    fn test_postgres_backend_requires_url() {
        let mut settings = valid_settings();
        settings.database.url.clear();
        assert_eq!(field_of(settings.validate().unwrap_err()), "database.url");
    }

    #[test]
    fn test_memory_backend_ignores_url() {
        let mut settings = valid_settings();
        settings.database.backend = StoreBackend::Memory;
        settings.database.url.clear();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut settings = valid_settings();
        settings.jwt.secret = "short".to_string();
        assert_eq!(field_of(settings.validate().unwrap_err()), "jwt.secret");
    }

    #[test]
    fn test_empty_internal_api_key_rejected() {
        let mut settings = valid_settings();
        settings.internal.api_key.clear();
        assert_eq!(field_of(settings.validate().unwrap_err()), "internal.api_key");
    }

    #[test]
    fn test_zero_internal_timeout_rejected() {
        let mut settings = valid_settings();
        settings.internal.timeout_seconds = 0;
        assert_eq!(
            field_of(settings.validate().unwrap_err()),
            "internal.timeout_seconds"
        );
    }

    #[test]
    fn test_malformed_base_urls_rejected() {
        let mut settings = valid_settings();
        settings.internal.products_base_url = "not a url".to_string();
        assert_eq!(
            field_of(settings.validate().unwrap_err()),
            "internal.products_base_url"
        );

        let mut settings = valid_settings();
        settings.email.public_base_url = "ftp://example.com".to_string();
        assert_eq!(
            field_of(settings.validate().unwrap_err()),
            "email.public_base_url"
        );
    }

    #[test]
    fn test_smtp_transport_requires_host() {
        let mut settings = valid_settings();
        settings.email.transport = EmailTransport::Smtp;
        assert_eq!(field_of(settings.validate().unwrap_err()), "email.smtp_host");

        settings.email.smtp_host = "smtp.example.com".to_string();
        assert!(settings.validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_any_nonzero_port_is_valid(port in 1u16..=u16::MAX) {
            let mut settings = valid_settings();
            settings.server.port = port;
            prop_assert!(settings.validate().is_ok());
        }

        #[test]
        fn prop_secret_length_threshold(len in 0usize..64) {
            let mut settings = valid_settings();
            settings.jwt.secret = "k".repeat(len);
            prop_assert_eq!(settings.validate().is_ok(), len >= MIN_JWT_SECRET_LEN);
        }
    }
}
