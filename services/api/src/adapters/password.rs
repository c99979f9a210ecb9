//! services/api/src/adapters/password.rs
//!
//! Argon2 password hashing for staff accounts.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use cinema_core::ports::{PortError, PortResult};
use tracing::warn;

/// Hashes a clear password into a PHC string suitable for the `users.password` column.
pub fn hash_password(password: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {}", e)))
}

/// A well-formed hash with the default Argon2 parameters that no password matches.
/// Verifying against it costs the same as a real check.
const UNKNOWN_USER_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Runs a full verification for a username that does not exist, so the
/// response takes as long as for a wrong password.
pub fn reject_unknown_user(password: &str) -> bool {
    verify_password(password, UNKNOWN_USER_HASH)
}

/// Checks a clear password against a stored PHC string.
///
/// A stored value that is not a PHC string (for example a legacy clear-text
/// row) never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password is not an argon2 hash: {}", e);
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_same_password() {
        let hash = hash_password("popcorn").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("popcorn", &hash));
        assert!(!verify_password("Popcorn", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("popcorn").unwrap();
        let second = hash_password("popcorn").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn unknown_user_hash_is_a_real_argon2_hash() {
        let parsed = PasswordHash::new(UNKNOWN_USER_HASH).unwrap();
        let default_hash = hash_password("popcorn").unwrap();
        let default = PasswordHash::new(&default_hash).unwrap();
        assert_eq!(parsed.algorithm, default.algorithm);
        assert_eq!(parsed.params, default.params);
        assert!(!reject_unknown_user("popcorn"));
        assert!(!reject_unknown_user(""));
    }

    #[test]
    fn clear_text_rows_never_verify() {
        assert!(!verify_password("popcorn", "popcorn"));
    }
}
