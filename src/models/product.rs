//! Product models for the catalog side.

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use jiff::Timestamp;
use jiff_diesel::ToDiesel;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// Bulk visibility instruction sent for every product of one owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityMode {
    Show,
    Hide,
    Remove,
}

impl VisibilityMode {
    /// Path segment used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityMode::Show => "show",
            VisibilityMode::Hide => "hide",
            VisibilityMode::Remove => "remove",
        }
    }
}

impl std::fmt::Display for VisibilityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisibilityMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "show" => Ok(VisibilityMode::Show),
            "hide" => Ok(VisibilityMode::Hide),
            "remove" => Ok(VisibilityMode::Remove),
            _ => Err(AppError::BadRequest {
                message: format!(
                    "Unknown visibility action '{}'. Expected show, hide or remove",
                    s
                ),
            }),
        }
    }
}

/// A catalog product.
///
/// `is_available` belongs to the owner; `is_hidden` belongs to the
/// visibility gate and is never written by catalog updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub is_available: bool,
    pub is_hidden: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub is_available: bool,
}

/// Owner-editable fields; visibility is not one of them.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub is_available: bool,
}

impl Product {
    pub fn create(input: NewProduct) -> Self {
        let now = Timestamp::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: input.owner_id,
            name: input.name,
            description: input.description,
            price: input.price,
            is_available: input.is_available,
            is_hidden: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: ProductUpdate) {
        self.name = update.name;
        self.description = update.description;
        self.price = update.price;
        self.is_available = update.is_available;
        self.updated_at = Timestamp::now();
    }
}

/// Row shape of the `products` table
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub is_available: bool,
    pub is_hidden: bool,
    pub created_at: jiff_diesel::Timestamp,
    pub updated_at: jiff_diesel::Timestamp,
}

/// Columns written by the catalog update path
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::products)]
#[diesel(treat_none_as_null = true)]
pub struct ProductChangeset {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub is_available: bool,
    pub updated_at: jiff_diesel::Timestamp,
}

impl From<&Product> for ProductRecord {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            owner_id: product.owner_id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.clone(),
            is_available: product.is_available,
            is_hidden: product.is_hidden,
            created_at: product.created_at.to_diesel(),
            updated_at: product.updated_at.to_diesel(),
        }
    }
}

impl From<ProductRecord> for Product {
    fn from(row: ProductRecord) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            price: row.price,
            is_available: row.is_available,
            is_hidden: row.is_hidden,
            created_at: row.created_at.to_jiff(),
            updated_at: row.updated_at.to_jiff(),
        }
    }
}

impl From<&Product> for ProductChangeset {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.clone(),
            is_available: product.is_available,
            updated_at: product.updated_at.to_diesel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_mode_wire_names() {
        for mode in [VisibilityMode::Show, VisibilityMode::Hide, VisibilityMode::Remove] {
            assert_eq!(mode.as_str().parse::<VisibilityMode>().unwrap(), mode);
        }
        assert!("HIDE".parse::<VisibilityMode>().is_err());
        assert!("archive".parse::<VisibilityMode>().is_err());
    }

    #[test]
    fn test_apply_update_keeps_hidden_flag() {
        let mut product = Product::create(NewProduct {
            owner_id: Uuid::new_v4(),
            name: "Lamp".to_string(),
            description: None,
            price: BigDecimal::from(10),
            is_available: true,
        });
        product.is_hidden = true;

        product.apply_update(ProductUpdate {
            name: "Desk lamp".to_string(),
            description: Some("Warm light".to_string()),
            price: BigDecimal::from(12),
            is_available: false,
        });

        assert!(product.is_hidden);
        assert_eq!(product.name, "Desk lamp");
        assert!(!product.is_available);
    }
}
