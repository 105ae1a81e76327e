//! Account repository for async database operations.
//!
//! Provides CRUD operations for the accounts table using diesel_async.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{Account, AccountRecord};
use crate::repositories::AccountStore;

/// Account repository holding an async connection pool.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap
/// (just reference count increment).
#[derive(Clone)]
pub struct PgAccountStore {
    pool: AsyncDbPool,
}

impl PgAccountStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_id(&self, account_id: Uuid) -> AppResult<Option<Account>> {
        use crate::schema::accounts::dsl::*;
        let mut conn = self.pool.get().await?;

        accounts
            .filter(id.eq(account_id))
            .select(AccountRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_by_email(&self, account_email: &str) -> AppResult<Option<Account>> {
        use crate::schema::accounts::dsl::*;
        let mut conn = self.pool.get().await?;

        accounts
            .filter(email.eq(account_email))
            .select(AccountRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)?
            .map(Account::try_from)
            .transpose()
    }

    async fn list(&self) -> AppResult<Vec<Account>> {
        use crate::schema::accounts::dsl::*;
        let mut conn = self.pool.get().await?;

        accounts
            .select(AccountRecord::as_select())
            .order(created_at.asc())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    async fn create(&self, account: &Account) -> AppResult<Account> {
        use crate::schema::accounts::dsl::*;
        let mut conn = self.pool.get().await?;

        let record = diesel::insert_into(accounts)
            .values(AccountRecord::from(account))
            .returning(AccountRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "insert account"))?;

        Account::try_from(record)
    }

    async fn update(&self, account: &Account) -> AppResult<Account> {
        use crate::schema::accounts::dsl::*;
        let mut conn = self.pool.get().await?;
        let record = AccountRecord::from(account);

        let updated = diesel::update(
            accounts
                .filter(id.eq(account.id))
                .filter(version.eq(account.version)),
        )
        .set((
            name.eq(&record.name),
            email.eq(&record.email),
            password_hash.eq(&record.password_hash),
            role.eq(record.role),
            is_active.eq(record.is_active),
            email_confirmed.eq(record.email_confirmed),
            email_confirmation_token.eq(&record.email_confirmation_token),
            email_confirmation_expires_at.eq(record.email_confirmation_expires_at),
            password_reset_token.eq(&record.password_reset_token),
            password_reset_expires_at.eq(record.password_reset_expires_at),
            version.eq(version + 1),
        ))
        .returning(AccountRecord::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "update account"))?;

        match updated {
            Some(row) => Account::try_from(row),
            None => {
                let exists: bool = diesel::select(diesel::dsl::exists(
                    accounts.filter(id.eq(account.id)),
                ))
                .get_result(&mut conn)
                .await
                .map_err(AppError::from)?;

                if exists {
                    Err(AppError::Conflict {
                        entity: "account".to_string(),
                        id: account.id.to_string(),
                    })
                } else {
                    Err(AppError::account_not_found(account.id))
                }
            }
        }
    }

    async fn delete(&self, account_id: Uuid) -> AppResult<bool> {
        use crate::schema::accounts::dsl::*;
        let mut conn = self.pool.get().await?;

        let affected = diesel::delete(accounts.filter(id.eq(account_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok(affected > 0)
    }
}
