//! Redis revocation store for camara-auth.
//!
//! Revocation entries are plain keys written with `SET key 1 EX ttl`, so Redis
//! expires them natively once the revoked token would have expired. Every
//! service instance pointed at the same Redis sees the same revocations.
//!
//! # Example
//!
//! ```ignore
//! use camara_auth_redis::connect;
//!
//! let store = connect(&config.revocation).await?;
//! let service = TokenService::from_config(&config, credentials, Arc::new(store));
//! ```

pub mod error;
pub mod pool;
pub mod store;

pub use error::RedisStoreError;
pub use pool::{connect, create_pool};
pub use store::RedisRevocationStore;
