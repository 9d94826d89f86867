//! Revocation store trait.
//!
//! A revoked token is recorded as a key derived from the token bytes, stored
//! with a TTL equal to the token's remaining lifetime. Once the TTL elapses the
//! token would fail expiry validation anyway, so the entry can disappear.
//!
//! The store is shared by every service instance; an in-process store is only
//! correct for a single instance.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::AuthResult;

/// Derives the revocation key for a token.
///
/// The key is `prefix` followed by the lowercase hex SHA-256 digest of the
/// encoded token, so raw tokens are never written to the store.
#[must_use]
pub fn revocation_key(prefix: &str, token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{prefix}{}", hex::encode(digest))
}

/// Key-value store with per-key TTL holding revocation entries.
///
/// # Errors
///
/// Implementations report an unreachable backend as
/// `AuthError::ServiceUnavailable`, which callers treat as fail-closed.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Records `key` for `ttl_secs` seconds.
    ///
    /// Writing an existing key again is harmless.
    async fn set(&self, key: &str, ttl_secs: u64) -> AuthResult<()>;

    /// Returns `true` if `key` is present and unexpired.
    async fn exists(&self, key: &str) -> AuthResult<bool>;
}
