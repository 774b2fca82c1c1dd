use bcrypt::{hash, verify};

use crate::errors::Result;

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(hash(password, cost)?)
}

/// A malformed stored hash counts as a mismatch rather than an error.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match verify(password, password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            false
        }
    }
}

/// Minimal strength rules: at least 8 characters, not only digits, not the username.
pub fn is_strong_enough(password: &str, username: &str) -> bool {
    password.chars().count() >= 8
        && !password.chars().all(|c| c.is_ascii_digit())
        && !password.eq_ignore_ascii_case(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("s3cret-pass", 4).unwrap();
        assert!(verify_password("s3cret-pass", &hashed));
        assert!(!verify_password("other-pass", &hashed));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn strength_rules() {
        assert!(is_strong_enough("correct-horse", "alice"));
        assert!(!is_strong_enough("short1", "alice"));
        assert!(!is_strong_enough("1234567890", "alice"));
        assert!(!is_strong_enough("AliceAlice", "alicealice"));
    }
}
