//! Password hashing with Argon2.
//!
//! Hashes are stored in PHC string format; verification goes through the
//! primitive's own comparison, never raw equality against the stored hash.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Hash a password with a fresh random salt.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// An unparseable stored hash counts as a failed verification.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let hash = hash_password("s3cret-enough").expect("hash");
        assert!(verify_password("s3cret-enough", &hash));
    }

    #[test]
    fn wrong_password_fails() {
        let hash = hash_password("s3cret-enough").expect("hash");
        assert!(!verify_password("not-the-password", &hash));
    }

    #[test]
    fn hash_is_not_the_plaintext() {
        let hash = hash_password("s3cret-enough").expect("hash");
        assert!(!hash.contains("s3cret-enough"));
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn same_password_hashes_differently() {
        // Fresh salt per call.
        let first = hash_password("s3cret-enough").expect("hash");
        let second = hash_password("s3cret-enough").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_stored_hash_fails_verification() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
