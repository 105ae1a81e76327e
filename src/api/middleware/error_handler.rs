//! Error handler for converting AppError to HTTP responses.
//!
//! This module implements the IntoResponse trait for AppError,
//! providing consistent error response formatting across the API.
//! Infrastructure errors are sanitized; their sources go to the log only.

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::ErrorResponse;
use crate::api::middleware::RequestId;
use crate::error::AppError;

/// Maps an AppError variant to its HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } | AppError::RemoteNotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. }
        | AppError::DuplicateEmail { .. }
        | AppError::Conflict { .. } => StatusCode::CONFLICT,
        AppError::InvalidRole { .. }
        | AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. }
        | AppError::InvalidRequest { .. }
        | AppError::TokenMismatch { .. } => StatusCode::BAD_REQUEST,
        AppError::TokenExpired { .. } => StatusCode::GONE,
        AppError::InvalidRecipient { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::InvalidCredentials | AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::EmailNotConfirmed | AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AppError::NotificationFailure { .. } | AppError::Remote { .. } => StatusCode::BAD_GATEWAY,
        AppError::Transport { .. } => StatusCode::GATEWAY_TIMEOUT,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Maps an AppError variant to its error code string.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Duplicate { .. } => "DUPLICATE_ENTRY",
        AppError::DuplicateEmail { .. } => "DUPLICATE_EMAIL",
        AppError::InvalidRole { .. } => "INVALID_ROLE",
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::InvalidRequest { .. } => "INVALID_REQUEST",
        AppError::InvalidRecipient { .. } => "INVALID_RECIPIENT",
        AppError::NotificationFailure { .. } => "NOTIFICATION_FAILURE",
        AppError::InvalidCredentials => "INVALID_CREDENTIALS",
        AppError::EmailNotConfirmed => "EMAIL_NOT_CONFIRMED",
        AppError::TokenMismatch { .. } => "TOKEN_MISMATCH",
        AppError::TokenExpired { .. } => "TOKEN_EXPIRED",
        AppError::Conflict { .. } => "CONFLICT",
        AppError::Unauthorized { .. } => "UNAUTHORIZED",
        AppError::Forbidden { .. } => "FORBIDDEN",
        AppError::RemoteNotFound { .. } => "REMOTE_NOT_FOUND",
        AppError::Remote { .. } => "REMOTE_ERROR",
        AppError::Transport { .. } => "TRANSPORT_ERROR",
        AppError::Database { .. } => "DATABASE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::ConnectionPool { .. } => "SERVICE_UNAVAILABLE",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

/// Builds the JSON body for an error.
pub fn error_to_body(error: &AppError) -> ErrorResponse {
    let code = error_to_code(error);
    match error {
        AppError::NotFound {
            entity,
            field,
            value,
        } => ErrorResponse::new(code, error.to_string()).with_details(json!({
            "entity": entity,
            "field": field,
            "value": value,
        })),
        AppError::Duplicate { entity, field, .. } => ErrorResponse::new(code, error.to_string())
            .with_details(json!({ "entity": entity, "field": field })),
        AppError::Validation { field, reason } => ErrorResponse::new(code, error.to_string())
            .with_details(json!([{ "field": field, "message": reason }])),
        AppError::ValidationErrors { errors } => {
            ErrorResponse::new(code, "Request validation failed").with_details(json!(errors))
        }
        AppError::Remote { status, .. } => {
            ErrorResponse::new(code, "Remote service request failed")
                .with_details(json!({ "status": status }))
        }
        AppError::Transport { .. } => ErrorResponse::new(code, "Remote service unreachable"),
        AppError::NotificationFailure { .. } => ErrorResponse::new(code, "Failed to send email"),
        AppError::Database { operation, .. } => {
            ErrorResponse::new(code, format!("Database operation failed: {}", operation))
        }
        AppError::Configuration { .. } => ErrorResponse::new(code, "Server misconfiguration"),
        AppError::ConnectionPool { .. } => {
            ErrorResponse::new(code, "Database connection unavailable")
        }
        AppError::Internal { .. } => ErrorResponse::new(code, "An internal error occurred"),
        _ => ErrorResponse::new(code, error.to_string()),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(error_to_body(&self))).into_response()
    }
}

fn default_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "The requested resource was not found",
        StatusCode::METHOD_NOT_ALLOWED => "HTTP method not allowed for this endpoint",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "Unsupported media type",
        StatusCode::REQUEST_TIMEOUT => "Request timeout",
        StatusCode::PAYLOAD_TOO_LARGE => "Request payload too large",
        s if s.is_server_error() => "An internal server error occurred",
        _ => "Bad request",
    }
}

/// Rewrites error responses that are not already JSON into `ErrorResponse`,
/// and stamps the request ID on every JSON error body.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    let (mut parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, 64 * 1024)
        .await
        .unwrap_or_default();

    if is_json {
        let Some(request_id) = request_id else {
            return Response::from_parts(parts, Body::from(bytes));
        };
        return match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.insert("request_id".to_string(), json!(request_id));
                parts.headers.remove(header::CONTENT_LENGTH);
                (parts, Json(serde_json::Value::Object(map))).into_response()
            }
            _ => Response::from_parts(parts, Body::from(bytes)),
        };
    }

    let original = String::from_utf8_lossy(&bytes).trim().to_string();
    let message = if original.is_empty() {
        default_message(status).to_string()
    } else {
        original
    };
    let code = status
        .canonical_reason()
        .unwrap_or("UNKNOWN_ERROR")
        .to_uppercase()
        .replace(' ', "_");

    let mut body = ErrorResponse::new(&code, message);
    if let Some(id) = request_id {
        body = body.with_request_id(&id);
    }
    (status, Json(body)).into_response()
}
