// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Hashes are scrypt PHC strings (`$scrypt$ln=..,r=..,p=..$salt$hash`) with a
//! fresh random salt each time. Hashing a value that already is such a string
//! returns it unchanged, so update flows that resend a stored hash do not
//! double-hash it. The same primitive protects stored refresh tokens.
use crate::error::AppError;
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Scrypt,
};
use std::sync::LazyLock;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

const SCRYPT_ALG_ID: &str = "scrypt";

/// Stand-in hash checked when no account matches, so a miss costs the same
/// scrypt work as a wrong password
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("tasklive-no-such-account").unwrap_or_default());

/// Password complexity requirements
#[derive(Debug, Clone)]
pub struct PasswordRequirements {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

/// Whether `value` is already an scrypt hash produced by [`hash_password`]
pub fn is_hashed(value: &str) -> bool {
    PasswordHash::new(value)
        .map(|parsed| parsed.algorithm.as_str() == SCRYPT_ALG_ID)
        .unwrap_or(false)
}

/// Hash a password using scrypt. Already-hashed input is passed through.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    if is_hashed(plain) {
        return Ok(plain.to_string());
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("scrypt hash: {e}")))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash. Any mismatch or unparsable hash is
/// `false`; the comparison itself is constant-time.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// [`hash_password`] on the blocking pool; scrypt is deliberately expensive
pub async fn hash_password_async(plain: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&plain)).await?
}

/// [`verify_password`] on the blocking pool
pub async fn verify_password_async(hash: String, plain: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&hash, &plain))
        .await
        .unwrap_or(false)
}

/// Burn one verification against a hash no password matches
pub async fn verify_dummy_async(plain: String) {
    let _ = tokio::task::spawn_blocking(move || verify_password(&DUMMY_HASH, &plain)).await;
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.chars().count() < requirements.min_length {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(char::is_lowercase) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Abcd123!").unwrap();

        assert_ne!(hash, "Abcd123!");
        assert!(hash.starts_with("$scrypt$"));
        assert!(verify_password(&hash, "Abcd123!"));
        assert!(!verify_password(&hash, "abcd123!"));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("Abcd123!").unwrap();
        let second = hash_password("Abcd123!").unwrap();

        assert_ne!(first, second);
        assert!(verify_password(&second, "Abcd123!"));
    }

    #[test]
    fn test_rehash_is_noop() {
        let hash = hash_password("Abcd123!").unwrap();

        assert!(is_hashed(&hash));
        assert_eq!(hash_password(&hash).unwrap(), hash);
        assert!(verify_password(&hash, "Abcd123!"));
    }

    #[test]
    fn test_plaintext_is_not_detected_as_hash() {
        assert!(!is_hashed("Abcd123!"));
        assert!(!is_hashed("$2b$10$notscryptatall"));
        assert!(!is_hashed(""));
    }

    #[test]
    fn test_verify_never_errors_on_garbage() {
        assert!(!verify_password("not-a-hash", "Abcd123!"));
        assert!(!verify_password("", ""));
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let hash = hash_password_async("Abcd123!".to_string()).await.unwrap();

        assert!(verify_password_async(hash.clone(), "Abcd123!".to_string()).await);
        assert!(!verify_password_async(hash, "wrong".to_string()).await);
    }

    #[tokio::test]
    async fn test_dummy_hash_matches_nothing() {
        assert!(is_hashed(&DUMMY_HASH));
        assert!(!verify_password(&DUMMY_HASH, "Abcd123!"));
        assert!(!verify_password(&DUMMY_HASH, ""));

        verify_dummy_async("Abcd123!".to_string()).await;
    }

    #[test]
    fn test_password_strength_validation() {
        let requirements = PasswordRequirements::default();

        assert!(validate_password_strength("Abcd123!", &requirements));
        // Too short
        assert!(!validate_password_strength("Ab1!", &requirements));
        // Missing uppercase
        assert!(!validate_password_strength("abcd123!", &requirements));
        // Missing lowercase
        assert!(!validate_password_strength("ABCD123!", &requirements));
        // Missing digit
        assert!(!validate_password_strength("Abcdefg!", &requirements));
        // Missing special character
        assert!(!validate_password_strength("Abcd1234", &requirements));

        let relaxed = PasswordRequirements {
            min_length: 4,
            require_uppercase: false,
            require_lowercase: true,
            require_digit: false,
            require_special: false,
        };
        assert!(validate_password_strength("abcd", &relaxed));
    }
}
