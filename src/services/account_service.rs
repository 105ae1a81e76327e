//! Account lifecycle: registration, login, email confirmation, password
//! reset, and the status transitions that are mirrored to the product
//! service.

use std::sync::Arc;

use jiff::Timestamp;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::{ProductVisibilityClient, VisibilityOutcome};
use crate::models::{
    Account, EMAIL_CONFIRMATION_VALIDITY, PASSWORD_RESET_VALIDITY, Role, StatusChange,
    TokenPurpose, VisibilityMode,
};
use crate::repositories::AccountStore;
use crate::services::notifications::{DeliveryOutcome, EmailMessage, Notifier, templates};
use crate::utils::password::{Verification, hash_password, verify_password};
use crate::utils::token::issue_token;

/// Answer to every password-reset request, whether or not the account exists.
pub const PASSWORD_RESET_REQUESTED_MESSAGE: &str =
    "If an active account exists for that email, a password reset link has been sent.";

/// Write attempts for a status change before a persistent `Conflict` is
/// returned.
const STATUS_WRITE_ATTEMPTS: usize = 3;

/// Input for `register`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Parsed case-insensitively; `None` means `User`
    pub role: Option<String>,
}

/// Input for `update_account`.
#[derive(Debug, Clone)]
pub struct AccountChanges {
    pub name: String,
    pub email: String,
}

/// Account lifecycle service.
///
/// Cloning is cheap; every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct AccountLifecycleService {
    accounts: Arc<dyn AccountStore>,
    notifier: Arc<dyn Notifier>,
    visibility: Arc<dyn ProductVisibilityClient>,
    public_base_url: String,
}

impl AccountLifecycleService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        notifier: Arc<dyn Notifier>,
        visibility: Arc<dyn ProductVisibilityClient>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            accounts,
            notifier,
            visibility,
            public_base_url: public_base_url.into(),
        }
    }

    /// Creates an account and emails its confirmation link.
    ///
    /// The account is persisted before the email goes out. If delivery fails
    /// the record is deleted again and the delivery error is returned.
    ///
    /// # Errors
    /// * `InvalidRole` - role string is not `User` or `Admin`
    /// * `DuplicateEmail` - the email is already registered
    /// * `InvalidRecipient` - the mail server rejected the address
    /// * `NotificationFailure` - any other delivery failure
    pub async fn register(&self, registration: Registration) -> AppResult<Account> {
        let role = match registration.role.as_deref() {
            Some(raw) => raw.parse::<Role>()?,
            None => Role::User,
        };

        if self
            .accounts
            .find_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateEmail {
                email: registration.email,
            });
        }

        let password_hash = hash_password(&registration.password)?;
        let mut account = Account::new(
            registration.name,
            registration.email,
            password_hash,
            role,
        );
        let pending = issue_token(EMAIL_CONFIRMATION_VALIDITY)?;
        let token = pending.token.clone();
        account.email_confirmation = Some(pending);

        let account = self.accounts.create(&account).await?;
        tracing::info!(account_id = %account.id, role = %account.role, "Account registered");

        let message = templates::confirmation_email(&self.public_base_url, &account.email, &token);
        let delivery = match message {
            Ok(message) => self.deliver(&message).await,
            Err(e) => Err(e),
        };

        if let Err(e) = delivery {
            tracing::warn!(
                account_id = %account.id,
                error = %e,
                "Confirmation email failed, removing account"
            );
            if let Err(delete_err) = self.accounts.delete(account.id).await {
                tracing::error!(
                    account_id = %account.id,
                    error = %delete_err,
                    "Compensating delete failed"
                );
            }
            return Err(e);
        }

        Ok(account)
    }

    /// Verifies credentials.
    ///
    /// Unknown email, inactive account and wrong password all produce the
    /// same `InvalidCredentials`. `EmailNotConfirmed` is only reported once
    /// the password has been verified.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Account> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            return Err(AppError::InvalidCredentials);
        };
        if !account.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let verification = verify_password(password, &account.password_hash)?;
        if !verification.is_match() {
            tracing::debug!(account_id = %account.id, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        if !account.email_confirmed {
            return Err(AppError::EmailNotConfirmed);
        }

        if verification == Verification::MatchNeedsRehash {
            return Ok(self.rehash(account, password).await);
        }

        Ok(account)
    }

    /// Upgrades an outdated hash. Failures leave the old hash in place.
    async fn rehash(&self, account: Account, password: &str) -> Account {
        let mut upgraded = account.clone();
        let result = match hash_password(password) {
            Ok(hash) => {
                upgraded.password_hash = hash;
                self.accounts.update(&upgraded).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(stored) => {
                tracing::info!(account_id = %stored.id, "Password hash upgraded");
                stored
            }
            Err(e) => {
                tracing::warn!(account_id = %account.id, error = %e, "Password rehash skipped");
                account
            }
        }
    }

    /// Consumes an email-confirmation token.
    ///
    /// A missing or already confirmed account is a successful no-op. The
    /// token is compared before its expiry is checked; an expired token is
    /// cleared before `TokenExpired` is returned. Losing the write to a
    /// concurrent confirmation of the same account still reports success.
    pub async fn confirm_email(&self, email: &str, token: &str) -> AppResult<bool> {
        let purpose = TokenPurpose::EmailConfirmation;
        let Some(mut account) = self.accounts.find_by_email(email).await? else {
            return Ok(true);
        };
        if account.email_confirmed {
            return Ok(true);
        }

        let expired = match account.pending_token(purpose) {
            Some(pending) if pending.matches(token) => pending.is_expired_at(Timestamp::now()),
            _ => return Err(AppError::TokenMismatch { purpose }),
        };

        account.clear_token(purpose);
        if expired {
            self.persist_token_change(&account, purpose).await?;
            return Err(AppError::TokenExpired { purpose });
        }

        account.email_confirmed = true;
        match self.accounts.update(&account).await {
            Ok(_) => {
                tracing::info!(account_id = %account.id, "Email confirmed");
                Ok(true)
            }
            Err(AppError::Conflict { .. }) => {
                let current = self.accounts.find_by_id(account.id).await?;
                if current.is_some_and(|current| current.email_confirmed) {
                    tracing::debug!(account_id = %account.id, "Email confirmed concurrently");
                    Ok(true)
                } else {
                    Err(AppError::TokenMismatch { purpose })
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Starts a password reset.
    ///
    /// Returns the same message whether or not an active account exists. A
    /// delivery failure is logged rather than surfaced, as is a token write
    /// lost to a concurrent update; no email goes out in that case.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<&'static str> {
        let Some(mut account) = self.accounts.find_by_email(email).await? else {
            return Ok(PASSWORD_RESET_REQUESTED_MESSAGE);
        };
        if !account.is_active {
            return Ok(PASSWORD_RESET_REQUESTED_MESSAGE);
        }

        let pending = issue_token(PASSWORD_RESET_VALIDITY)?;
        let token = pending.token.clone();
        account.password_reset = Some(pending);
        let account = match self.accounts.update(&account).await {
            Ok(account) => account,
            Err(AppError::Conflict { .. }) => {
                tracing::warn!(
                    account_id = %account.id,
                    "Password reset token write lost to a concurrent update"
                );
                return Ok(PASSWORD_RESET_REQUESTED_MESSAGE);
            }
            Err(e) => return Err(e),
        };

        let message =
            templates::password_reset_email(&self.public_base_url, &account.email, &token)?;
        match self.deliver(&message).await {
            Ok(()) => tracing::info!(account_id = %account.id, "Password reset email sent"),
            Err(e) => {
                tracing::warn!(account_id = %account.id, error = %e, "Password reset email failed")
            }
        }

        Ok(PASSWORD_RESET_REQUESTED_MESSAGE)
    }

    /// Consumes a password-reset token and replaces the password hash.
    pub async fn fulfill_password_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> AppResult<bool> {
        let purpose = TokenPurpose::PasswordReset;
        let mut account = match self.accounts.find_by_email(email).await? {
            Some(account) if account.is_active => account,
            _ => {
                return Err(AppError::InvalidRequest {
                    message: "Invalid password reset request".to_string(),
                });
            }
        };

        let expired = match account.pending_token(purpose) {
            Some(pending) if pending.matches(token) => pending.is_expired_at(Timestamp::now()),
            _ => return Err(AppError::TokenMismatch { purpose }),
        };

        account.clear_token(purpose);
        if expired {
            self.persist_token_change(&account, purpose).await?;
            return Err(AppError::TokenExpired { purpose });
        }

        account.password_hash = hash_password(new_password)?;
        self.persist_token_change(&account, purpose).await?;
        tracing::info!(account_id = %account.id, "Password reset completed");
        Ok(true)
    }

    /// Activates or deactivates an account and mirrors the change to the
    /// owner's products.
    ///
    /// The local write commits first. A write that loses to a concurrent
    /// update is re-read and re-applied, up to `STATUS_WRITE_ATTEMPTS` times.
    /// The product call then runs on its own task so dropping this future
    /// cannot abort it; its outcome is only logged. Returns `false` when the
    /// account does not exist.
    pub async fn change_status(&self, id: Uuid, target: StatusChange) -> AppResult<bool> {
        let mut attempt = 1;
        loop {
            let Some(mut account) = self.accounts.find_by_id(id).await? else {
                return Ok(false);
            };

            account.is_active = target.is_active();
            match self.accounts.update(&account).await {
                Ok(_) => break,
                Err(AppError::Conflict { .. }) if attempt < STATUS_WRITE_ATTEMPTS => {
                    tracing::debug!(account_id = %id, attempt, "Status write conflicted; retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!(account_id = %id, is_active = target.is_active(), "Account status changed");

        let mode = match target {
            StatusChange::Activate => VisibilityMode::Show,
            StatusChange::Deactivate => VisibilityMode::Hide,
        };
        let visibility = Arc::clone(&self.visibility);
        let call = tokio::spawn(async move { visibility.set_visibility(id, mode).await });

        match call.await {
            Ok(VisibilityOutcome::Success) => {
                tracing::debug!(owner_id = %id, action = %mode, "Products updated")
            }
            Ok(outcome) => tracing::warn!(
                owner_id = %id,
                action = %mode,
                outcome = ?outcome,
                "Product visibility update failed; account change kept"
            ),
            Err(e) => tracing::error!(
                owner_id = %id,
                action = %mode,
                error = %e,
                "Product visibility task aborted"
            ),
        }

        Ok(true)
    }

    /// Removes the owner's products remotely, then the account locally.
    ///
    /// `Success` and `RemoteNotFound` allow the local delete. Any other
    /// outcome leaves the account in place and returns `false`.
    pub async fn delete_account(&self, id: Uuid) -> AppResult<bool> {
        if self.accounts.find_by_id(id).await?.is_none() {
            return Ok(false);
        }

        let outcome = self.visibility.set_visibility(id, VisibilityMode::Remove).await;
        match outcome {
            VisibilityOutcome::Success | VisibilityOutcome::RemoteNotFound => {
                let deleted = self.accounts.delete(id).await?;
                tracing::info!(account_id = %id, remote = ?outcome, "Account deleted");
                Ok(deleted)
            }
            other => {
                tracing::warn!(
                    account_id = %id,
                    outcome = ?other,
                    "Product removal failed; account kept"
                );
                Ok(false)
            }
        }
    }

    pub async fn get_account(&self, id: Uuid) -> AppResult<Account> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::account_not_found(id))
    }

    pub async fn list_accounts(&self) -> AppResult<Vec<Account>> {
        self.accounts.list().await
    }

    /// Replaces name and email.
    pub async fn update_account(&self, id: Uuid, changes: AccountChanges) -> AppResult<Account> {
        let mut account = self.get_account(id).await?;

        if changes.email != account.email {
            if let Some(other) = self.accounts.find_by_email(&changes.email).await? {
                if other.id != id {
                    return Err(AppError::DuplicateEmail {
                        email: changes.email,
                    });
                }
            }
        }

        account.name = changes.name;
        account.email = changes.email;
        self.accounts.update(&account).await
    }

    /// Writes a token-consuming change. Losing a concurrent race means the
    /// token was already used, so `Conflict` is reported as `TokenMismatch`.
    async fn persist_token_change(
        &self,
        account: &Account,
        purpose: TokenPurpose,
    ) -> AppResult<Account> {
        self.accounts.update(account).await.map_err(|e| match e {
            AppError::Conflict { .. } => AppError::TokenMismatch { purpose },
            other => other,
        })
    }

    async fn deliver(&self, message: &EmailMessage) -> AppResult<()> {
        match self.notifier.send(message).await {
            DeliveryOutcome::Delivered => Ok(()),
            DeliveryOutcome::InvalidRecipient(reason) => {
                tracing::debug!(to = %message.to, reason = %reason, "Recipient rejected");
                Err(AppError::InvalidRecipient {
                    address: message.to.clone(),
                })
            }
            DeliveryOutcome::Failed(reason) => Err(AppError::NotificationFailure {
                source: anyhow::anyhow!(reason),
            }),
        }
    }
}
