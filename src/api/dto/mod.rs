//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `auth` - registration, login, confirmation and reset payloads
//! - `account` - account administration
//! - `product` - catalog and visibility
//! - `error` - Common error response DTOs

mod account;
mod auth;
mod error;
mod product;

pub use account::{AccountResponse, UpdateAccountRequest};
pub use auth::{
    AuthResponse, ConfirmEmailQuery, ForgotPasswordRequest, LoginRequest, MessageResponse,
    RegisterRequest, ResetPasswordRequest,
};
pub use error::ErrorResponse;
pub use product::{
    CreateProductRequest, ProductResponse, UpdateProductRequest, VisibilityResponse,
};
