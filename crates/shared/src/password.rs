//! Admin password hashing with Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// OWASP 2024 parameters: 19 MiB, 2 iterations, 1 lane.
const MEMORY_COST: u32 = 19456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

/// Minimum length for admin passwords.
pub const MIN_PASSWORD_LEN: usize = 12;

fn argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashError(format!("Failed to create Argon2 params: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Verifies against `hash` when present, otherwise burns a comparable amount of
/// work and returns `false`. Login uses this so unknown emails and wrong
/// passwords take the same time.
pub fn verify_password_or_dummy(password: &str, hash: Option<&str>) -> bool {
    match hash {
        Some(hash) => verify_password(password, hash).unwrap_or(false),
        None => {
            let _ = hash_password(password);
            false
        }
    }
}

/// Returns a list of rule violations; empty means the password is acceptable.
pub fn password_strength_issues(password: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        issues.push("Password must be at least 12 characters");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        issues.push("Password must contain a letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("Password must contain a digit");
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_returns_phc_format() {
        let hash = hash_password("correct horse 42").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
    }

    #[test]
    fn test_hash_password_is_salted() {
        assert_ne!(
            hash_password("same_password1").unwrap(),
            hash_password("same_password1").unwrap()
        );
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("my_secure_password123!").unwrap();
        assert!(verify_password("my_secure_password123!", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("password", "invalid_hash_format");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_verify_or_dummy() {
        let hash = hash_password("admin-password-1").unwrap();
        assert!(verify_password_or_dummy("admin-password-1", Some(&hash)));
        assert!(!verify_password_or_dummy("admin-password-1", None));
        assert!(!verify_password_or_dummy("admin-password-1", Some("garbage")));
    }

    #[test]
    fn test_password_strength() {
        assert!(password_strength_issues("longenough123").is_empty());
        assert_eq!(
            password_strength_issues("short1"),
            vec!["Password must be at least 12 characters"]
        );
        assert!(password_strength_issues("no-digits-here-at-all")
            .contains(&"Password must contain a digit"));
        assert!(password_strength_issues("123456789012345")
            .contains(&"Password must contain a letter"));
    }
}
