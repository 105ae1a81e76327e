//! Store traits shared by the PostgreSQL and in-memory backends.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Account, Product, VisibilityMode};

/// Persistence for account records.
///
/// Email lookups are exact and case-sensitive.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>>;

    async fn list(&self) -> AppResult<Vec<Account>>;

    /// Insert a new account. Fails with `DuplicateEmail` on an email collision.
    async fn create(&self, account: &Account) -> AppResult<Account>;

    /// Replace every mutable field, guarded by `account.version`.
    ///
    /// Returns the stored account with its version bumped. A row whose
    /// version moved on since it was read yields `Conflict`; a missing row
    /// yields `NotFound`.
    async fn update(&self, account: &Account) -> AppResult<Account>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// Persistence for catalog products.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;

    async fn create(&self, product: &Product) -> AppResult<Product>;

    /// Write the owner-editable fields. `is_hidden` is left untouched.
    async fn update(&self, product: &Product) -> AppResult<Product>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Apply `mode` to every product of `owner_id` as one atomic unit.
    ///
    /// Returns the number of affected products; zero is not an error.
    async fn apply_visibility(&self, owner_id: Uuid, mode: VisibilityMode) -> AppResult<u64>;
}
