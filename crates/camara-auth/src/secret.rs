//! Client secret generation and verification.
//!
//! Client secrets are stored only as Argon2id PHC strings. Plaintext secrets
//! are shown once, at generation, and never logged.
//!
//! # Example
//!
//! ```
//! use camara_auth::secret::{generate_client_secret, hash_client_secret, verify_client_secret};
//!
//! let secret = generate_client_secret();
//! let hash = hash_client_secret(&secret).unwrap();
//!
//! assert!(verify_client_secret(&secret, &hash).unwrap());
//! assert!(!verify_client_secret("guess", &hash).unwrap());
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use std::sync::LazyLock;

/// Number of random bytes in a generated secret.
pub const CLIENT_SECRET_BYTES: usize = 32;

/// Generates a new client secret.
///
/// The secret is 256 random bits, hex encoded (64 characters).
#[must_use]
pub fn generate_client_secret() -> String {
    let bytes: [u8; CLIENT_SECRET_BYTES] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// Hashes a client secret with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails.
pub fn hash_client_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Checks a presented secret against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch. The comparison is constant-time.
///
/// # Errors
///
/// Returns an error only if `hash` is not a valid PHC string.
pub fn verify_client_secret(
    secret: &str,
    hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

/// Hash of a random secret nobody holds, built with the same parameters as
/// every stored hash.
static UNKNOWN_CLIENT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_client_secret(&generate_client_secret()).ok());

/// Performs one Argon2 verification against a throwaway hash and returns
/// `false`.
///
/// Called when the client does not exist or is inactive, so that failure
/// costs the same as a secret mismatch for a registered client.
pub fn verify_unknown_client(secret: &str) -> bool {
    if let Some(hash) = UNKNOWN_CLIENT_HASH.as_deref() {
        let _ = verify_client_secret(secret, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secret_format() {
        let secret = generate_client_secret();
        assert_eq!(secret.len(), CLIENT_SECRET_BYTES * 2);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_secrets_differ() {
        assert_ne!(generate_client_secret(), generate_client_secret());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_client_secret("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("s3cret"));

        assert!(verify_client_secret("s3cret", &hash).unwrap());
        assert!(!verify_client_secret("s3cret ", &hash).unwrap());
        assert!(!verify_client_secret("", &hash).unwrap());
    }

    #[test]
    fn test_same_secret_hashes_differently() {
        assert_ne!(
            hash_client_secret("s3cret").unwrap(),
            hash_client_secret("s3cret").unwrap()
        );
    }

    #[test]
    fn test_unknown_client_hash_matches_stored_parameters() {
        assert!(!verify_unknown_client("s3cret"));

        let dummy = UNKNOWN_CLIENT_HASH.as_deref().unwrap();
        let stored = hash_client_secret("s3cret").unwrap();
        let dummy = PasswordHash::new(dummy).unwrap();
        let stored = PasswordHash::new(&stored).unwrap();

        assert_eq!(dummy.algorithm, stored.algorithm);
        assert_eq!(dummy.version, stored.version);
        assert_eq!(dummy.params.to_string(), stored.params.to_string());
    }

    #[test]
    fn test_invalid_hash_is_error() {
        assert!(verify_client_secret("s3cret", "plaintext").is_err());
    }
}
