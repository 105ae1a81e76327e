use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Account, Role};

/// JWT Claims structure containing account information and token metadata
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for an account
    ///
    /// # Arguments
    /// * `account` - The authenticated account
    /// * `expiration_hours` - Token validity duration in hours
    pub fn new(account: &Account, expiration_hours: i64) -> AppResult<Self> {
        let now = Timestamp::now();
        let exp = now
            .checked_add(SignedDuration::from_hours(expiration_hours))
            .map_err(|e| AppError::Internal {
                source: anyhow::anyhow!("JWT expiry out of range: {}", e),
            })?;

        Ok(Self {
            sub: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            iat: now.as_second(),
            exp: exp.as_second(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Generates an HS256 access token for an account
///
/// # Arguments
/// * `account` - The account the token is issued to
/// * `secret` - The secret key for signing the token
/// * `expiration_hours` - Token validity duration in hours
///
/// # Returns
/// The encoded JWT token string
pub fn generate_access_token(
    account: &Account,
    secret: &str,
    expiration_hours: i64,
) -> AppResult<String> {
    sign_claims(&Claims::new(account, expiration_hours)?, secret)
}

/// Signs already-built claims with HS256
pub fn sign_claims(claims: &Claims, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
    })
}

/// Validates and decodes an access token
///
/// # Returns
/// The decoded claims if the signature and expiry are valid
///
/// # Example
/// ```ignore
/// let claims = validate_access_token(&token, "secret")?;
/// println!("Account ID: {}", claims.sub);
/// ```
pub fn validate_access_token(token: &str, secret: &str) -> AppResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test_secret_key_for_jwt_testing_0123";

    fn account(role: Role) -> Account {
        Account::new(
            "Test".to_string(),
            "test@example.com".to_string(),
            "hash".to_string(),
            role,
        )
    }

    #[test]
    fn test_generate_and_validate_token() {
        let account = account(Role::Admin);
        let token = generate_access_token(&account, TEST_SECRET, 1).unwrap();
        assert_eq!(token.matches('.').count(), 2);

        let claims = validate_access_token(&token, TEST_SECRET).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.name, "Test");
        assert!(claims.is_admin());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = generate_access_token(&account(Role::User), TEST_SECRET, 1).unwrap();
        match validate_access_token(&token, "another_secret_key_that_is_long_enough") {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("signature")),
            other => panic!("Expected Unauthorized error, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_token_rejected() {
        // Beyond the default 60s leeway
        let token = generate_access_token(&account(Role::User), TEST_SECRET, -2).unwrap();
        match validate_access_token(&token, TEST_SECRET) {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("expired")),
            other => panic!("Expected Unauthorized error, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            validate_access_token("not.a.token", TEST_SECRET),
            Err(AppError::Unauthorized { .. })
        ));
    }
}
