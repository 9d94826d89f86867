//! Pool construction from revocation configuration.

use camara_auth::config::RevocationConfig;
use deadpool_redis::{Pool, PoolConfig, Runtime, Timeouts};

use crate::error::RedisStoreError;
use crate::store::RedisRevocationStore;

/// Builds a connection pool. No connection is opened yet.
///
/// Waiting for, creating and recycling a connection are each bounded by
/// `config.timeout`.
///
/// # Errors
///
/// Returns `RedisStoreError::CreatePool` if the URL is invalid.
pub fn create_pool(config: &RevocationConfig) -> Result<Pool, RedisStoreError> {
    let mut timeouts = Timeouts::default();
    timeouts.wait = Some(config.timeout);
    timeouts.create = Some(config.timeout);
    timeouts.recycle = Some(config.timeout);

    let mut pool_config = PoolConfig::new(config.pool_size);
    pool_config.timeouts = timeouts;

    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    redis_config.pool = Some(pool_config);

    Ok(redis_config.create_pool(Some(Runtime::Tokio1))?)
}

/// Builds a pool, checks that Redis is reachable, and returns the store.
///
/// Unlike a cache, the revocation store has no local fallback: starting
/// without it would accept revoked tokens.
///
/// # Errors
///
/// Returns an error if the URL is invalid or no connection can be made.
pub async fn connect(config: &RevocationConfig) -> Result<RedisRevocationStore, RedisStoreError> {
    let pool = create_pool(config)?;

    match pool.get().await {
        Ok(_) => {
            tracing::info!(pool_size = config.pool_size, "Connected to revocation store");
            Ok(RedisRevocationStore::new(pool))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to revocation store");
            Err(e.into())
        }
    }
}
