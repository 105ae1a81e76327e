//! Application state for the two service roles.
//!
//! Each role gets its own Axum state holding its services and the JWT
//! configuration. Cloning is cheap; everything inside sits behind an `Arc`.

use crate::config::JwtConfig;
use crate::services::{AccountServices, ProductServices};

/// State of the accounts service.
#[derive(Clone)]
pub struct AccountsState {
    pub services: AccountServices,
    /// JWT configuration for issuing and validating access tokens
    pub jwt_config: JwtConfig,
}

impl AccountsState {
    pub fn new(services: AccountServices, jwt_config: JwtConfig) -> Self {
        Self {
            services,
            jwt_config,
        }
    }
}

/// State of the products service.
#[derive(Clone)]
pub struct ProductsState {
    pub services: ProductServices,
    /// JWT configuration for validating owner tokens
    pub jwt_config: JwtConfig,
}

impl ProductsState {
    pub fn new(services: ProductServices, jwt_config: JwtConfig) -> Self {
        Self {
            services,
            jwt_config,
        }
    }
}
