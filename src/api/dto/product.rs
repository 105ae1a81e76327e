//! Product DTOs for API requests and responses.

use bigdecimal::{BigDecimal, Zero};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{NewProduct, Product, ProductUpdate};

fn validate_positive_price(price: &BigDecimal) -> Result<(), ValidationError> {
    if price > &BigDecimal::zero() {
        Ok(())
    } else {
        let mut error = ValidationError::new("positive");
        error.message = Some("Price must be greater than zero".into());
        Err(error)
    }
}

/// Request body for `POST /api/products`. The owner comes from the bearer token.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 150, message = "Name must be between 1 and 150 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive_price"))]
    pub price: BigDecimal,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

impl CreateProductRequest {
    pub fn into_new_product(self, owner_id: Uuid) -> NewProduct {
        NewProduct {
            owner_id,
            name: self.name,
            description: self.description,
            price: self.price,
            is_available: self.is_available,
        }
    }
}

/// Request body for `PUT /api/products/{id}`. There is no hidden flag.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 150, message = "Name must be between 1 and 150 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive_price"))]
    pub price: BigDecimal,
    pub is_available: bool,
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(request: UpdateProductRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            price: request.price,
            is_available: request.is_available,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub is_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            owner_id: product.owner_id,
            name: product.name,
            description: product.description,
            price: product.price,
            is_available: product.is_available,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Body of a visibility acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct VisibilityResponse {
    pub owner_id: Uuid,
    pub action: String,
    pub affected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn request(price: &str) -> CreateProductRequest {
        CreateProductRequest {
            name: "Lamp".to_string(),
            description: None,
            price: BigDecimal::from_str(price).unwrap(),
            is_available: true,
        }
    }

    #[test]
    fn test_price_must_be_positive() {
        assert!(request("0.01").validate().is_ok());
        assert!(request("0").validate().is_err());
        assert!(request("-3").validate().is_err());
    }

    #[test]
    fn test_update_request_ignores_hidden_flag() {
        let request: UpdateProductRequest = serde_json::from_str(
            r#"{"name":"Lamp","price":"5","is_available":true,"is_hidden":false}"#,
        )
        .unwrap();
        let update: ProductUpdate = request.into();
        assert_eq!(update.name, "Lamp");
    }

    #[test]
    fn test_long_description_rejected() {
        let mut r = request("1");
        r.description = Some("x".repeat(2001));
        assert!(r.validate().is_err());
    }
}
