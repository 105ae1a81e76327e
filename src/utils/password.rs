use argon2::{
    Algorithm, Argon2, Params,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{AppError, AppResult};

/// Outcome of checking a plaintext password against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Match,
    /// Password is correct but the hash uses outdated algorithm or parameters.
    /// Authorizes exactly like `Match`.
    MatchNeedsRehash,
    Mismatch,
}

impl Verification {
    pub fn is_match(&self) -> bool {
        !matches!(self, Verification::Mismatch)
    }
}

fn hash_error(e: argon2::password_hash::Error) -> AppError {
    AppError::Internal {
        source: anyhow::anyhow!("Password hashing failed: {}", e),
    }
}

/// Hash a password using Argon2id
///
/// # Arguments
/// * `password` - The plain text password to hash
///
/// # Returns
/// * `AppResult<String>` - The PHC-formatted hash string or an error
///
/// # Example
/// ```ignore
/// let hashed = hash_password("my_secure_password")?;
/// ```
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(hash_error)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash
///
/// # Arguments
/// * `password` - The plain text password to verify
/// * `password_hash` - The PHC-formatted hash to verify against
///
/// # Returns
/// * `AppResult<Verification>` - Err only when the stored hash cannot be parsed
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<Verification> {
    let parsed = PasswordHash::new(password_hash).map_err(hash_error)?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return Ok(Verification::Mismatch);
    }

    if needs_rehash(&parsed) {
        Ok(Verification::MatchNeedsRehash)
    } else {
        Ok(Verification::Match)
    }
}

fn needs_rehash(parsed: &PasswordHash<'_>) -> bool {
    if parsed.algorithm != Algorithm::Argon2id.ident() {
        return true;
    }

    let current = Params::default();
    match Params::try_from(parsed) {
        Ok(params) => {
            params.m_cost() != current.m_cost()
                || params.t_cost() != current.t_cost()
                || params.p_cost() != current.p_cost()
        }
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::Version;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").expect("Failed to hash password");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify_password_match() {
        let hash = hash_password("test_password_123").unwrap();
        assert_eq!(
            verify_password("test_password_123", &hash).unwrap(),
            Verification::Match
        );
    }

    #[test]
    fn test_verify_password_mismatch() {
        let hash = hash_password("test_password_123").unwrap();
        let result = verify_password("wrong_password", &hash).unwrap();
        assert_eq!(result, Verification::Mismatch);
        assert!(!result.is_match());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hash1 = hash_password("test_password_123").unwrap();
        let hash2 = hash_password("test_password_123").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("test_password_123", &hash1).unwrap().is_match());
        assert!(verify_password("test_password_123", &hash2).unwrap().is_match());
    }

    #[test]
    fn test_legacy_algorithm_needs_rehash() {
        let salt = SaltString::generate(&mut OsRng);
        let legacy = Argon2::new(Algorithm::Argon2i, Version::V0x13, Params::default())
            .hash_password(b"secret1", &salt)
            .unwrap()
            .to_string();

        let result = verify_password("secret1", &legacy).unwrap();
        assert_eq!(result, Verification::MatchNeedsRehash);
        assert!(result.is_match());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
