use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;

/// Hash a password using Argon2id with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Password hashing failed: {}", e))
}

/// Verify a password against its stored PHC-format hash.
///
/// A mismatch is `Ok(false)`; an unparseable stored hash is an error, so a
/// corrupt credential record is never reported as a wrong password.
pub fn verify_password(hash: &str, password: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow!("Failed to parse password hash: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub(super) static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Run one full verification against a throwaway hash, so a login for an
/// unknown username does the same argon2 work as a wrong password.
pub fn verify_dummy_password(password: &str) {
    let hash = DUMMY_HASH.get_or_init(|| hash_password("campus-portal-unknown-user").ok());
    if let Some(hash) = hash {
        let _ = verify_password(hash, password);
    }
}
