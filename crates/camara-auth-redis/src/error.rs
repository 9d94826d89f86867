//! Redis backend errors.

use camara_auth::AuthError;

/// Errors that can occur while talking to Redis.
#[derive(Debug, thiserror::Error)]
pub enum RedisStoreError {
    /// The pool could not be built from configuration.
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(#[from] deadpool_redis::CreatePoolError),

    /// No connection could be obtained from the pool.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// A command failed.
    #[error("Redis command failed: {0}")]
    Command(#[from] redis::RedisError),
}

impl RedisStoreError {
    /// Returns `true` if the error is a configuration problem rather than
    /// an unreachable server.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::CreatePool(_))
    }
}

impl From<RedisStoreError> for AuthError {
    fn from(err: RedisStoreError) -> Self {
        if err.is_configuration_error() {
            AuthError::configuration(err.to_string())
        } else {
            // The revocation answer is unknown; callers fail closed.
            AuthError::service_unavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_is_service_unavailable() {
        let redis_err = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"));
        let err: AuthError = RedisStoreError::from(redis_err).into();

        assert!(matches!(err, AuthError::ServiceUnavailable { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_create_pool_error_is_configuration() {
        let Err(create_err) = deadpool_redis::Config::from_url("not a url")
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        else {
            panic!("invalid URL accepted");
        };
        let err = RedisStoreError::from(create_err);

        assert!(err.is_configuration_error());
        assert!(matches!(
            AuthError::from(err),
            AuthError::Configuration { .. }
        ));
    }
}
