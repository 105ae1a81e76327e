//! Account DTOs for API requests and responses.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Account, Role};
use crate::services::AccountChanges;

/// Request body for `PUT /api/users/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

impl From<UpdateAccountRequest> for AccountChanges {
    fn from(request: UpdateAccountRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
        }
    }
}

/// Public view of an account (no password hash, no pending tokens).
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub email_confirmed: bool,
    pub created_at: Timestamp,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            is_active: account.is_active,
            email_confirmed: account.email_confirmed,
            created_at: account.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PendingToken;

    #[test]
    fn test_response_omits_secrets() {
        let mut account = Account::new(
            "Ann".to_string(),
            "ann@example.com".to_string(),
            "$argon2id$hash".to_string(),
            Role::Admin,
        );
        account.email_confirmation = Some(PendingToken {
            token: "f".repeat(64),
            expires_at: Timestamp::now(),
        });

        let json = serde_json::to_string(&AccountResponse::from(account)).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains(&"f".repeat(64)));
        assert!(json.contains("\"role\":\"Admin\""));
    }
}
