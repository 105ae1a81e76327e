//! Single-use token issuance for email confirmation and password reset.

use jiff::{SignedDuration, Timestamp};
use rand::RngCore;

use crate::error::{AppError, AppResult};
use crate::models::PendingToken;

/// Random bytes per token; rendered as twice as many hex characters.
pub const TOKEN_BYTES: usize = 32;

/// Compares two secrets without short-circuiting on the first differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Issue a token from the thread-local CSPRNG, valid for `validity` from now.
pub fn issue_token(validity: SignedDuration) -> AppResult<PendingToken> {
    issue_token_with(&mut rand::rng(), Timestamp::now(), validity)
}

/// Issue a token from the given random source and clock reading.
pub fn issue_token_with<R: RngCore + ?Sized>(
    rng: &mut R,
    now: Timestamp,
    validity: SignedDuration,
) -> AppResult<PendingToken> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill_bytes(&mut bytes);

    let expires_at = now.checked_add(validity).map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("token expiry out of range: {}", e),
    })?;

    Ok(PendingToken {
        token: hex::encode(bytes),
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_issue_token_expiry() {
        let now = Timestamp::now();
        let validity = SignedDuration::from_hours(24);
        let token = issue_token_with(&mut rand::rng(), now, validity).unwrap();
        assert_eq!(token.expires_at.duration_since(now), validity);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"ABC", b"abc"));
    }

    #[test]
    fn test_consecutive_tokens_differ() {
        let a = issue_token(SignedDuration::from_hours(1)).unwrap();
        let b = issue_token(SignedDuration::from_hours(1)).unwrap();
        assert_ne!(a.token, b.token);
    }

    proptest! {
        #[test]
        fn prop_token_is_64_lowercase_hex(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let validity = SignedDuration::from_hours(1);
            let token = issue_token_with(&mut rng, Timestamp::UNIX_EPOCH, validity).unwrap();
            prop_assert_eq!(token.token.len(), 2 * TOKEN_BYTES);
            prop_assert!(token.token.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        }
    }
}
