mod app_error;
mod database_converter;

pub use app_error::{AppError, AppResult, INVALID_CREDENTIALS_MESSAGE, ValidationFieldError};
pub use database_converter::DatabaseErrorConverter;
