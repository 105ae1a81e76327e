//! Product side: the owner-visibility gate called by the account service,
//! and the owner-scoped catalog operations.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product, ProductUpdate, VisibilityMode};
use crate::repositories::ProductStore;
use crate::utils::token::constant_time_eq;

/// Inbound handler for owner visibility instructions, guarded by a
/// pre-shared key.
#[derive(Clone)]
pub struct ProductVisibilityGate {
    products: Arc<dyn ProductStore>,
    api_key: String,
}

impl ProductVisibilityGate {
    pub fn new(products: Arc<dyn ProductStore>, api_key: impl Into<String>) -> Self {
        Self {
            products,
            api_key: api_key.into(),
        }
    }

    /// Checks the credential without touching any product.
    pub fn authorize(&self, credential: Option<&str>) -> AppResult<()> {
        match credential {
            Some(key)
                if !self.api_key.is_empty()
                    && constant_time_eq(key.as_bytes(), self.api_key.as_bytes()) =>
            {
                Ok(())
            }
            _ => Err(AppError::Unauthorized {
                message: "Invalid internal API key".to_string(),
            }),
        }
    }

    /// Shows, hides or removes every product of `owner_id` in one unit.
    ///
    /// An owner with no products is still a success.
    pub async fn apply_visibility(
        &self,
        credential: Option<&str>,
        owner_id: Uuid,
        mode: VisibilityMode,
    ) -> AppResult<u64> {
        if let Err(e) = self.authorize(credential) {
            tracing::warn!(owner_id = %owner_id, action = %mode, "Rejected visibility call");
            return Err(e);
        }

        let affected = self.products.apply_visibility(owner_id, mode).await?;
        tracing::info!(owner_id = %owner_id, action = %mode, affected, "Owner visibility applied");
        Ok(affected)
    }
}

/// Owner-scoped catalog operations.
#[derive(Clone)]
pub struct ProductCatalogService {
    products: Arc<dyn ProductStore>,
}

impl ProductCatalogService {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    /// Gets a product. Hidden products are reported as not found.
    pub async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        match self.products.find_by_id(id).await? {
            Some(product) if !product.is_hidden => Ok(product),
            _ => Err(AppError::product_not_found(id)),
        }
    }

    pub async fn create_product(&self, input: NewProduct) -> AppResult<Product> {
        let product = self.products.create(&Product::create(input)).await?;
        tracing::info!(product_id = %product.id, owner_id = %product.owner_id, "Product created");
        Ok(product)
    }

    /// Updates the owner-editable fields. `is_hidden` cannot change here.
    pub async fn update_product(
        &self,
        owner_id: Uuid,
        id: Uuid,
        update: ProductUpdate,
    ) -> AppResult<Product> {
        let mut product = self.owned_product(owner_id, id).await?;
        product.apply_update(update);
        self.products.update(&product).await
    }

    pub async fn delete_product(&self, owner_id: Uuid, id: Uuid) -> AppResult<bool> {
        self.owned_product(owner_id, id).await?;
        let deleted = self.products.delete(id).await?;
        tracing::info!(product_id = %id, owner_id = %owner_id, "Product deleted");
        Ok(deleted)
    }

    async fn owned_product(&self, owner_id: Uuid, id: Uuid) -> AppResult<Product> {
        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::product_not_found(id))?;

        if product.owner_id != owner_id {
            return Err(AppError::Forbidden {
                message: "Only the owner may modify this product".to_string(),
            });
        }
        Ok(product)
    }
}
