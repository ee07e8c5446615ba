use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ApiError;

/// Minimum accepted password length for new accounts.
const MIN_PASSWORD_LEN: usize = 8;

/// hash_password
///
/// Hashes a plaintext password with Argon2id (default parameters, random
/// 16-byte salt) and returns the PHC-formatted string stored in the `users`
/// table. Rejects passwords shorter than [`MIN_PASSWORD_LEN`] before hashing.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e).into()))?
        .to_string();

    Ok(password_hash)
}

/// verify_password
///
/// Verifies a plaintext password against a stored PHC hash. A mismatch is a
/// normal `false`; only a malformed stored hash or a backend failure is an
/// error.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| ApiError::Internal(format!("invalid password hash format: {}", e).into()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(
            format!("password verification failed: {}", e).into(),
        )),
    }
}
