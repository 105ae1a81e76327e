//! Product repository for async database operations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Product, ProductChangeset, ProductRecord, VisibilityMode};
use crate::repositories::ProductStore;

#[derive(Clone)]
pub struct PgProductStore {
    pool: AsyncDbPool,
}

impl PgProductStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_id(&self, product_id: Uuid) -> AppResult<Option<Product>> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        let row = products
            .filter(id.eq(product_id))
            .select(ProductRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)?;

        Ok(row.map(Product::from))
    }

    async fn create(&self, product: &Product) -> AppResult<Product> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(products)
            .values(ProductRecord::from(product))
            .returning(ProductRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map(Product::from)
            .map_err(AppError::from)
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(products.filter(id.eq(product.id)))
            .set(ProductChangeset::from(product))
            .returning(ProductRecord::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)?
            .map(Product::from)
            .ok_or_else(|| AppError::product_not_found(product.id))
    }

    async fn delete(&self, product_id: Uuid) -> AppResult<bool> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        let affected = diesel::delete(products.filter(id.eq(product_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(affected > 0)
    }

    async fn apply_visibility(&self, owner: Uuid, mode: VisibilityMode) -> AppResult<u64> {
        use crate::schema::products::dsl::*;
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let affected = conn
            .transaction::<usize, AppError, _>(|conn| {
                async move {
                    let owned = products.filter(owner_id.eq(owner));
                    let affected = match mode {
                        VisibilityMode::Show => {
                            diesel::update(owned)
                                .set(is_hidden.eq(false))
                                .execute(conn)
                                .await?
                        }
                        VisibilityMode::Hide => {
                            diesel::update(owned)
                                .set(is_hidden.eq(true))
                                .execute(conn)
                                .await?
                        }
                        VisibilityMode::Remove => diesel::delete(owned).execute(conn).await?,
                    };
                    Ok(affected)
                }
                .scope_boxed()
            })
            .await?;

        Ok(affected as u64)
    }
}
