//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! stores, the notifier and the product visibility client.

mod account_service;
pub mod notifications;
mod product_service;

pub use account_service::{
    AccountChanges, AccountLifecycleService, PASSWORD_RESET_REQUESTED_MESSAGE, Registration,
};
pub use product_service::{ProductCatalogService, ProductVisibilityGate};

use std::sync::Arc;

use crate::config::Settings;
use crate::error::AppResult;
use crate::external::{HttpVisibilityClient, ProductVisibilityClient};
use crate::repositories::Repositories;
use crate::services::notifications::{Notifier, build_notifier};

/// Services of the accounts role.
#[derive(Clone)]
pub struct AccountServices {
    pub accounts: AccountLifecycleService,
}

impl AccountServices {
    /// Wires the lifecycle service to the configured notifier and the HTTP
    /// visibility client.
    pub fn from_settings(repos: &Repositories, settings: &Settings) -> AppResult<Self> {
        let notifier = build_notifier(&settings.email)?;
        tracing::info!(transport = notifier.name(), "Email notifier ready");
        let visibility: Arc<dyn ProductVisibilityClient> =
            Arc::new(HttpVisibilityClient::new(&settings.internal)?);
        Ok(Self::new(
            repos,
            notifier,
            visibility,
            &settings.email.public_base_url,
        ))
    }

    pub fn new(
        repos: &Repositories,
        notifier: Arc<dyn Notifier>,
        visibility: Arc<dyn ProductVisibilityClient>,
        public_base_url: &str,
    ) -> Self {
        Self {
            accounts: AccountLifecycleService::new(
                repos.accounts.clone(),
                notifier,
                visibility,
                public_base_url,
            ),
        }
    }
}

/// Services of the products role.
#[derive(Clone)]
pub struct ProductServices {
    pub catalog: ProductCatalogService,
    pub gate: ProductVisibilityGate,
}

impl ProductServices {
    pub fn new(repos: &Repositories, internal_api_key: &str) -> Self {
        Self {
            catalog: ProductCatalogService::new(repos.products.clone()),
            gate: ProductVisibilityGate::new(repos.products.clone(), internal_api_key),
        }
    }
}
