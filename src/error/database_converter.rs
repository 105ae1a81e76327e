use crate::error::AppError;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// Unique index on `accounts.email`.
pub const ACCOUNTS_EMAIL_CONSTRAINT: &str = "accounts_email_key";

/// Utility for converting database errors to structured AppError variants.
///
/// Known constraint names map to domain errors; anything else becomes a
/// generic `Duplicate`/`Validation`/`Database` error carrying the
/// PostgreSQL message.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    ///
    /// # Returns
    /// An AppError variant appropriate for the type of database error
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let message = info.message();
        let constraint = info.constraint_name().unwrap_or_default();
        let key_value = info
            .details()
            .and_then(Self::extract_key_value)
            .or_else(|| Self::extract_key_value(message));

        match kind {
            DatabaseErrorKind::UniqueViolation if constraint == ACCOUNTS_EMAIL_CONSTRAINT => {
                AppError::DuplicateEmail {
                    email: key_value.map(|(_, value)| value).unwrap_or_default(),
                }
            }
            DatabaseErrorKind::UniqueViolation => match key_value {
                Some((field, value)) => AppError::Duplicate {
                    entity: info.table_name().unwrap_or("resource").to_string(),
                    field,
                    value,
                },
                None => AppError::Database {
                    operation: operation.to_string(),
                    source: anyhow::anyhow!("Unique constraint violation: {}", message),
                },
            },
            DatabaseErrorKind::CheckViolation => AppError::Validation {
                field: constraint.to_string(),
                reason: format!("Check constraint failed: {}", message),
            },
            DatabaseErrorKind::NotNullViolation => AppError::Validation {
                field: info.column_name().unwrap_or("unknown").to_string(),
                reason: "Field is required".to_string(),
            },
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::anyhow!("Database error: {}", message),
            },
        }
    }

    /// Pulls `(column, value)` out of a PostgreSQL `Key (column)=(value)` detail.
    fn extract_key_value(text: &str) -> Option<(String, String)> {
        let rest = &text[text.find("Key (")? + 5..];
        let (column, rest) = rest.split_once(")=(")?;
        let end = rest.rfind(')')?;
        Some((column.to_string(), rest[..end].to_string()))
    }
}
