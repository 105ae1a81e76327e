//! In-memory store backends.
//!
//! Each store keeps its rows in a mutex-guarded map. The lock is never held
//! across an `.await`, and set mutations take it once for the whole set.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Account, Product, VisibilityMode};
use crate::repositories::{AccountStore, ProductStore};

fn lock<T>(mutex: &Mutex<T>) -> AppResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| AppError::internal(format!("store lock poisoned: {}", e)))
}

#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(lock(&self.accounts)?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        Ok(lock(&self.accounts)?
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Account>> {
        let mut all: Vec<Account> = lock(&self.accounts)?.values().cloned().collect();
        all.sort_by_key(|a| a.created_at);
        Ok(all)
    }

    async fn create(&self, account: &Account) -> AppResult<Account> {
        let mut accounts = lock(&self.accounts)?;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::DuplicateEmail {
                email: account.email.clone(),
            });
        }
        if accounts.contains_key(&account.id) {
            return Err(AppError::Duplicate {
                entity: "account".to_string(),
                field: "id".to_string(),
                value: account.id.to_string(),
            });
        }
        accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn update(&self, account: &Account) -> AppResult<Account> {
        let mut accounts = lock(&self.accounts)?;

        let current_version = match accounts.get(&account.id) {
            Some(current) => current.version,
            None => return Err(AppError::account_not_found(account.id)),
        };
        if current_version != account.version {
            return Err(AppError::Conflict {
                entity: "account".to_string(),
                id: account.id.to_string(),
            });
        }
        if accounts
            .values()
            .any(|a| a.id != account.id && a.email == account.email)
        {
            return Err(AppError::DuplicateEmail {
                email: account.email.clone(),
            });
        }

        let mut stored = account.clone();
        stored.version += 1;
        accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(lock(&self.accounts)?.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryProductStore {
    products: Mutex<HashMap<Uuid, Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every product of `owner_id`, hidden ones included.
    pub fn products_of(&self, owner_id: Uuid) -> AppResult<Vec<Product>> {
        Ok(lock(&self.products)?
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(lock(&self.products)?.get(&id).cloned())
    }

    async fn create(&self, product: &Product) -> AppResult<Product> {
        let mut products = lock(&self.products)?;
        if products.contains_key(&product.id) {
            return Err(AppError::Duplicate {
                entity: "product".to_string(),
                field: "id".to_string(),
                value: product.id.to_string(),
            });
        }
        products.insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        let mut products = lock(&self.products)?;
        let stored = products
            .get_mut(&product.id)
            .ok_or_else(|| AppError::product_not_found(product.id))?;

        stored.name = product.name.clone();
        stored.description = product.description.clone();
        stored.price = product.price.clone();
        stored.is_available = product.is_available;
        stored.updated_at = product.updated_at;
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(lock(&self.products)?.remove(&id).is_some())
    }

    async fn apply_visibility(&self, owner_id: Uuid, mode: VisibilityMode) -> AppResult<u64> {
        let mut products = lock(&self.products)?;

        let affected = match mode {
            VisibilityMode::Show | VisibilityMode::Hide => {
                let hidden = mode == VisibilityMode::Hide;
                let mut count = 0;
                for product in products.values_mut().filter(|p| p.owner_id == owner_id) {
                    product.is_hidden = hidden;
                    count += 1;
                }
                count
            }
            VisibilityMode::Remove => {
                let before = products.len();
                products.retain(|_, p| p.owner_id != owner_id);
                (before - products.len()) as u64
            }
        };

        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProduct, Role};
    use bigdecimal::BigDecimal;

    fn account(email: &str) -> Account {
        Account::new(
            "Ann".to_string(),
            email.to_string(),
            "hash".to_string(),
            Role::User,
        )
    }

    fn product(owner_id: Uuid) -> Product {
        Product::create(NewProduct {
            owner_id,
            name: "Chair".to_string(),
            description: None,
            price: BigDecimal::from(5),
            is_available: true,
        })
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let store = MemoryAccountStore::new();
        store.create(&account("a@example.com")).await.unwrap();

        let err = store.create(&account("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail { .. }));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = MemoryAccountStore::new();
        store.create(&account("Ann@example.com")).await.unwrap();

        assert!(store.find_by_email("ann@example.com").await.unwrap().is_none());
        assert!(store.find_by_email("Ann@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_detects_stale_writes() {
        let store = MemoryAccountStore::new();
        let created = store.create(&account("a@example.com")).await.unwrap();

        let mut first = created.clone();
        first.name = "First".to_string();
        let stored = store.update(&first).await.unwrap();
        assert_eq!(stored.version, created.version + 1);

        let mut stale = created.clone();
        stale.name = "Stale".to_string();
        assert!(matches!(
            store.update(&stale).await,
            Err(AppError::Conflict { .. })
        ));
        assert_eq!(
            store.find_by_id(created.id).await.unwrap().unwrap().name,
            "First"
        );
    }

    #[tokio::test]
    async fn test_update_missing_account_is_not_found() {
        let store = MemoryAccountStore::new();
        assert!(matches!(
            store.update(&account("ghost@example.com")).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_apply_visibility_touches_only_owner() {
        let store = MemoryProductStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.create(&product(owner)).await.unwrap();
        store.create(&product(owner)).await.unwrap();
        store.create(&product(other)).await.unwrap();

        assert_eq!(store.apply_visibility(owner, VisibilityMode::Hide).await.unwrap(), 2);
        assert!(store.products_of(owner).unwrap().iter().all(|p| p.is_hidden));
        assert!(store.products_of(other).unwrap().iter().all(|p| !p.is_hidden));

        assert_eq!(store.apply_visibility(owner, VisibilityMode::Show).await.unwrap(), 2);
        assert!(store.products_of(owner).unwrap().iter().all(|p| !p.is_hidden));

        assert_eq!(store.apply_visibility(owner, VisibilityMode::Remove).await.unwrap(), 2);
        assert!(store.products_of(owner).unwrap().is_empty());
        assert_eq!(store.products_of(other).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_visibility_with_no_products_is_success() {
        let store = MemoryProductStore::new();
        assert_eq!(
            store
                .apply_visibility(Uuid::new_v4(), VisibilityMode::Remove)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_update_does_not_touch_hidden_flag() {
        let store = MemoryProductStore::new();
        let owner = Uuid::new_v4();
        let created = store.create(&product(owner)).await.unwrap();
        store.apply_visibility(owner, VisibilityMode::Hide).await.unwrap();

        let mut edited = created.clone();
        edited.name = "Stool".to_string();
        let stored = store.update(&edited).await.unwrap();

        assert_eq!(stored.name, "Stool");
        assert!(stored.is_hidden);
    }
}
