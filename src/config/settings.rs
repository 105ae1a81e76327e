//! Configuration settings structures for account-sync
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use serde::{Deserialize, Serialize};

use crate::logger::LoggerConfig;

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "account-sync".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_keep_alive_timeout() -> u64 {
    75
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_access_token_expiration() -> i64 {
    1 // 1 hour
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

fn default_sender() -> String {
    "Account Sync <no-reply@localhost>".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_products_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_internal_timeout() -> u64 {
    10
}

// ============================================================================
// Root Settings
// ============================================================================

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub logger: LoggerConfig,

    /// Outbound email settings
    #[serde(default)]
    pub email: EmailConfig,

    /// Service-to-service settings shared by both services
    #[serde(default)]
    pub internal: InternalConfig,
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Keep-alive timeout in seconds
    #[serde(default = "default_keep_alive_timeout")]
    pub keep_alive_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            keep_alive_timeout: default_keep_alive_timeout(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Which store implementation backs the services
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local maps; data is lost on restart
    Memory,
}

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Store backend
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Whether to automatically run pending migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

// ============================================================================
// JWT Configuration
// ============================================================================

/// JWT authentication configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    /// IMPORTANT: This should be a strong, random string in production
    /// and should be kept secret (use environment variables)
    #[serde(default)]
    pub secret: String,

    /// Access token expiration time in hours
    #[serde(default = "default_access_token_expiration")]
    pub access_token_expiration: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_expiration: default_access_token_expiration(),
        }
    }
}

// ============================================================================
// Email Configuration
// ============================================================================

/// How outbound email leaves the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    Smtp,
    /// Write messages to the log instead of sending them
    #[default]
    Log,
}

/// Outbound email configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub transport: EmailTransport,

    /// SMTP relay host
    #[serde(default)]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    /// Use STARTTLS when talking to the relay
    #[serde(default = "default_true")]
    pub starttls: bool,

    /// From header, e.g. `Account Sync <no-reply@example.com>`
    #[serde(default = "default_sender")]
    pub sender: String,

    /// Base URL used when building confirmation and reset links
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: EmailTransport::default(),
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            starttls: default_true(),
            sender: default_sender(),
            public_base_url: default_public_base_url(),
        }
    }
}

// ============================================================================
// Internal (service-to-service) Configuration
// ============================================================================

/// Shared settings for the account -> product visibility call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalConfig {
    /// Pre-shared key sent in `X-Internal-Api-Key`
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the product service
    #[serde(default = "default_products_base_url")]
    pub products_base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_internal_timeout")]
    pub timeout_seconds: u64,
}

impl Default for InternalConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            products_base_url: default_products_base_url(),
            timeout_seconds: default_internal_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_address() {
        let server = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(server.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.application.name, "account-sync");
        assert_eq!(settings.database.backend, StoreBackend::Postgres);
        assert_eq!(settings.email.transport, EmailTransport::Log);
        assert_eq!(settings.internal.timeout_seconds, 10);
        assert_eq!(settings.jwt.access_token_expiration, 1);
    }

    #[test]
    fn test_backend_and_transport_deserialize_lowercase() {
        let db: DatabaseConfig =
            serde_json::from_str(r#"{"backend":"memory"}"#).expect("valid json");
        assert_eq!(db.backend, StoreBackend::Memory);

        let email: EmailConfig =
            serde_json::from_str(r#"{"transport":"smtp","smtp_host":"mail"}"#).expect("valid json");
        assert_eq!(email.transport, EmailTransport::Smtp);
        assert_eq!(email.smtp_port, 587);
        assert!(email.starttls);
    }
}
