//! Argon2id password hashing.
//!
//! Hashes are stored in PHC string format, so parameters can be tightened
//! later without invalidating existing credentials.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use domains::{DomainError, Result};

/// Hashes a plaintext password with a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(DomainError::internal)?;
    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored PHC hash.
///
/// An unparseable stored hash verifies as false rather than erroring;
/// a corrupted credential must read as "wrong password", not a 500.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("tr0ub4dor&3", &hash));
    }

    #[test]
    fn garbage_stored_hash_is_just_a_mismatch() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
