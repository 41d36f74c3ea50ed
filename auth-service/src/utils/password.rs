//! Argon2id password hashing.
//!
//! Verification goes through `argon2`'s constant-time comparison; there
//! is no plaintext equality path anywhere in the service.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use service_core::error::AppError;

/// A plaintext password in flight. Deliberately not `Debug`/`Display`
/// so it cannot end up in logs.
pub struct Password(String);

impl Password {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn hash_password(password: &Password) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("password hashing: {}", e)))?;
    Ok(hash.to_string())
}

/// Whether `password` matches `stored_hash`. A hash that fails to parse
/// is an internal error, not a mismatch.
pub fn verify_password(password: &Password, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("stored hash is invalid: {}", e)))?;

    match Argon2::default().verify_password(password.as_str().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::InternalError(anyhow::anyhow!(
            "password verification: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let password = Password::new("correct horse battery staple");
        let hash = hash_password(&password).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&password, &hash).unwrap());
        assert!(!verify_password(&Password::new("wrong"), &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let password = Password::new("repeatable-input");
        let first = hash_password(&password).unwrap();
        let second = hash_password(&password).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_stored_hash_is_an_error_not_a_mismatch() {
        let result = verify_password(&Password::new("anything"), "not-a-phc-string");
        assert!(matches!(result, Err(AppError::InternalError(_))));
    }
}
