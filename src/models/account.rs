//! Account models.
//!
//! `Account` is the domain record the lifecycle service works with.
//! `AccountRecord` is its row shape in the `accounts` table, where each
//! pending token is stored as two nullable columns.

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use jiff::{SignedDuration, Timestamp};
use jiff_diesel::ToDiesel;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::token::constant_time_eq;

/// How long an email-confirmation token stays valid.
pub const EMAIL_CONFIRMATION_VALIDITY: SignedDuration = SignedDuration::from_hours(24);

/// How long a password-reset token stays valid.
pub const PASSWORD_RESET_VALIDITY: SignedDuration = SignedDuration::from_hours(1);

// ============================================================================
// Role
// ============================================================================

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; anything other than `user`/`admin` is `InvalidRole`.
impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(AppError::InvalidRole {
                value: s.to_string(),
            }),
        }
    }
}

impl ToSql<Text, Pg> for Role {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for Role {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "User" => Ok(Role::User),
            "Admin" => Ok(Role::Admin),
            _ => Err(format!("Unrecognized role: {}", s).into()),
        }
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// What a single-use token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    EmailConfirmation,
    PasswordReset,
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenPurpose::EmailConfirmation => f.write_str("email confirmation"),
            TokenPurpose::PasswordReset => f.write_str("password reset"),
        }
    }
}

/// An outstanding single-use token together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToken {
    pub token: String,
    pub expires_at: Timestamp,
}

impl PendingToken {
    pub fn matches(&self, candidate: &str) -> bool {
        constant_time_eq(self.token.as_bytes(), candidate.as_bytes())
    }

    /// A token is expired once `now` is strictly past its expiry.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at < now
    }
}

// ============================================================================
// Account
// ============================================================================

/// Target state for `change_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Activate,
    Deactivate,
}

impl StatusChange {
    pub fn is_active(&self) -> bool {
        matches!(self, StatusChange::Activate)
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub email_confirmed: bool,
    pub created_at: Timestamp,
    pub email_confirmation: Option<PendingToken>,
    pub password_reset: Option<PendingToken>,
    /// Row version for conditional updates; bumped by every successful write
    pub version: i64,
}

impl Account {
    /// A freshly registered account: active, unconfirmed, no tokens.
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            is_active: true,
            email_confirmed: false,
            created_at: Timestamp::now(),
            email_confirmation: None,
            password_reset: None,
            version: 0,
        }
    }

    pub fn pending_token(&self, purpose: TokenPurpose) -> Option<&PendingToken> {
        match purpose {
            TokenPurpose::EmailConfirmation => self.email_confirmation.as_ref(),
            TokenPurpose::PasswordReset => self.password_reset.as_ref(),
        }
    }

    pub fn clear_token(&mut self, purpose: TokenPurpose) {
        match purpose {
            TokenPurpose::EmailConfirmation => self.email_confirmation = None,
            TokenPurpose::PasswordReset => self.password_reset = None,
        }
    }
}

// ============================================================================
// Row mapping
// ============================================================================

/// Row shape of the `accounts` table
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AccountRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub email_confirmed: bool,
    pub email_confirmation_token: Option<String>,
    pub email_confirmation_expires_at: Option<jiff_diesel::Timestamp>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires_at: Option<jiff_diesel::Timestamp>,
    pub version: i64,
    pub created_at: jiff_diesel::Timestamp,
}

fn split_token(token: &Option<PendingToken>) -> (Option<String>, Option<jiff_diesel::Timestamp>) {
    match token {
        Some(t) => (Some(t.token.clone()), Some(t.expires_at.to_diesel())),
        None => (None, None),
    }
}

fn join_token(
    column: &str,
    token: Option<String>,
    expires_at: Option<jiff_diesel::Timestamp>,
) -> Result<Option<PendingToken>, AppError> {
    match (token, expires_at) {
        (Some(token), Some(expires_at)) => Ok(Some(PendingToken {
            token,
            expires_at: expires_at.to_jiff(),
        })),
        (None, None) => Ok(None),
        _ => Err(AppError::internal(format!(
            "{} token and expiry must be set together",
            column
        ))),
    }
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        let (email_confirmation_token, email_confirmation_expires_at) =
            split_token(&account.email_confirmation);
        let (password_reset_token, password_reset_expires_at) =
            split_token(&account.password_reset);

        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            role: account.role,
            is_active: account.is_active,
            email_confirmed: account.email_confirmed,
            email_confirmation_token,
            email_confirmation_expires_at,
            password_reset_token,
            password_reset_expires_at,
            version: account.version,
            created_at: account.created_at.to_diesel(),
        }
    }
}

impl TryFrom<AccountRecord> for Account {
    type Error = AppError;

    fn try_from(row: AccountRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            email_confirmation: join_token(
                "email_confirmation",
                row.email_confirmation_token,
                row.email_confirmation_expires_at,
            )?,
            password_reset: join_token(
                "password_reset",
                row.password_reset_token,
                row.password_reset_expires_at,
            )?,
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role,
            is_active: row.is_active,
            email_confirmed: row.email_confirmed,
            created_at: row.created_at.to_jiff(),
            version: row.version,
        })
    }
}
