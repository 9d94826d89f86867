//! Redis-backed [`RevocationStore`].

use async_trait::async_trait;
use camara_auth::{AuthResult, RevocationStore};
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::error::RedisStoreError;

/// Value stored under every revocation key.
const REVOKED_MARKER: &str = "1";

/// Revocation store backed by a pooled Redis connection.
#[derive(Clone)]
pub struct RedisRevocationStore {
    pool: Pool,
}

impl RedisRevocationStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    async fn set_entry(&self, key: &str, ttl_secs: u64) -> Result<(), RedisStoreError> {
        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(key, REVOKED_MARKER, ttl_secs).await?;
        Ok(())
    }

    async fn has_entry(&self, key: &str) -> Result<bool, RedisStoreError> {
        let mut conn = self.pool.get().await?;
        Ok(conn.exists::<_, bool>(key).await?)
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn set(&self, key: &str, ttl_secs: u64) -> AuthResult<()> {
        // EX 0 is rejected by Redis; a zero TTL entry would expire at once anyway.
        if ttl_secs == 0 {
            return Ok(());
        }

        self.set_entry(key, ttl_secs).await.map_err(|e| {
            tracing::warn!(error = %e, "Redis SET failed");
            e.into()
        })
    }

    async fn exists(&self, key: &str) -> AuthResult<bool> {
        self.has_entry(key).await.map_err(|e| {
            tracing::warn!(error = %e, "Redis EXISTS failed");
            e.into()
        })
    }
}
