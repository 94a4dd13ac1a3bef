//! Password hashing
//!
//! Argon2id hashing and verification with per-password random salts.
//! Hashes are stored in PHC string format, so parameters travel with the
//! hash and can be upgraded later without touching stored records.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a raw password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a raw password against a stored PHC-format hash.
///
/// Returns `Ok(false)` on a mismatch; an error means the stored hash is
/// malformed or verification itself failed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e))
            .context("Password verification error"),
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Hashes never equal or contain the raw password, the correct
        /// password verifies, and a perturbed one does not.
        #[test]
        fn property_password_secure_storage(
            password in "[a-zA-Z0-9!@#$%^&*()_+-=]{1,50}"
        ) {
            let hash = hash_password(&password).expect("Hashing should succeed");

            prop_assert_ne!(&hash, &password);
            prop_assert!(hash.starts_with("$argon2id$"));
            prop_assert!(!hash.contains(&password) || password.len() < 4);

            prop_assert!(verify_password(&password, &hash).expect("Verify should not error"));

            let wrong = format!("{}x", password);
            prop_assert!(!verify_password(&wrong, &hash).expect("Verify should not error"));
        }
    }
}
