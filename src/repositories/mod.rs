//! Repository layer for data access operations.
//!
//! Provides async CRUD operations for accounts and products behind the
//! `AccountStore` and `ProductStore` traits, with PostgreSQL and in-memory
//! backends.

mod account_repo;
mod memory;
mod product_repo;
mod traits;

pub use account_repo::PgAccountStore;
pub use memory::{MemoryAccountStore, MemoryProductStore};
pub use product_repo::PgProductStore;
pub use traits::{AccountStore, ProductStore};

use std::sync::Arc;

use crate::db::AsyncDbPool;

/// Aggregates both stores for convenient access.
///
/// Cloning is cheap; each store sits behind an `Arc`.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountStore>,
    pub products: Arc<dyn ProductStore>,
}

impl Repositories {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self {
            accounts: Arc::new(PgAccountStore::new(pool.clone())),
            products: Arc::new(PgProductStore::new(pool)),
        }
    }

    /// Process-local stores.
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(MemoryAccountStore::new()),
            products: Arc::new(MemoryProductStore::new()),
        }
    }
}
