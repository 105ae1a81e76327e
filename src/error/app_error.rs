use crate::error::DatabaseErrorConverter;
use crate::models::TokenPurpose;
use serde::Serialize;
use thiserror::Error;

/// Message shared by every authentication failure so callers cannot tell
/// an unknown email, an inactive account and a wrong password apart.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

/// Application-wide error type that represents all possible errors in the system.
///
/// Account-lifecycle failures carry their own variants so that callers can
/// match on them; infrastructure failures wrap an `anyhow::Error` source.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Duplicate entry error for unique constraint violations
    #[error("Duplicate entry: {entity}.{field} = '{value}' already exists")]
    Duplicate {
        entity: String,
        field: String,
        value: String,
    },

    /// An account with this email already exists
    #[error("An account with email '{email}' already exists")]
    DuplicateEmail { email: String },

    /// Role string did not parse to a known role
    #[error("Invalid role '{value}'. Allowed values: User, Admin")]
    InvalidRole { value: String },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Several field validation failures collected from a request payload
    #[error("Validation failed: {} field error(s)", errors.len())]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Request refers to an account that cannot take part in the operation
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Mail server reported that the recipient does not exist
    #[error("The email address '{address}' does not exist")]
    InvalidRecipient { address: String },

    /// Email could not be delivered for any other reason
    #[error("Failed to send email")]
    NotificationFailure {
        #[source]
        source: anyhow::Error,
    },

    /// Unknown email, inactive account, or wrong password
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,

    /// Credentials are valid but the email address was never confirmed
    #[error("Email address is not confirmed")]
    EmailNotConfirmed,

    /// Supplied token does not match the stored one
    #[error("Invalid {purpose} token")]
    TokenMismatch { purpose: TokenPurpose },

    /// Stored token has passed its expiry
    #[error("The {purpose} token has expired")]
    TokenExpired { purpose: TokenPurpose },

    /// Row changed between read and conditional write
    #[error("Concurrent modification of {entity} {id}")]
    Conflict { entity: String, id: String },

    /// Unauthorized access error with authentication message
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Forbidden access error with authorization message
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Remote service answered "not found"
    #[error("Remote resource not found: {resource}")]
    RemoteNotFound { resource: String },

    /// Remote service answered with a non-success status
    #[error("Remote service error (status {status}): {detail}")]
    Remote { status: u16, detail: String },

    /// Remote service could not be reached or timed out
    #[error("Transport error: {detail}")]
    Transport { detail: String },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Connection pool error
    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Shorthand for a missing account.
    pub fn account_not_found(id: impl ToString) -> Self {
        AppError::NotFound {
            entity: "account".to_string(),
            field: "id".to_string(),
            value: id.to_string(),
        }
    }

    /// Shorthand for a missing product.
    pub fn product_not_found(id: impl ToString) -> Self {
        AppError::NotFound {
            entity: "product".to_string(),
            field: "id".to_string(),
            value: id.to_string(),
        }
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        AppError::Internal {
            source: anyhow::anyhow!("{}", message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<diesel_async::pooled_connection::PoolError> for AppError {
    fn from(error: diesel_async::pooled_connection::PoolError) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::from(error),
        }
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for AppError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::from(error),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut collected: Vec<ValidationFieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |e| ValidationFieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        collected.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationErrors { errors: collected }
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        let message = match error.kind() {
            ErrorKind::ExpiredSignature => "Token has expired",
            ErrorKind::InvalidSignature => "Invalid token signature",
            _ => "Invalid token",
        };
        AppError::Unauthorized {
            message: message.to_string(),
        }
    }
}

impl From<crate::config::error::ConfigError> for AppError {
    fn from(error: crate::config::error::ConfigError) -> Self {
        let key = match &error {
            crate::config::error::ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "settings".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::from(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
