//! Token core configuration.
//!
//! The configuration is loaded once at process start, validated, and then
//! handed by reference to every component constructor. Nothing in the crate
//! reads ambient global state after that point.
//!
//! # Example (TOML)
//!
//! ```toml
//! environment = "production"
//!
//! [jwt]
//! secret_key = "a-long-random-secret-of-at-least-32-bytes"
//! algorithm = "HS256"
//! access_token_lifetime = "60m"
//!
//! [revocation]
//! url = "redis://localhost:6380/0"
//! timeout = "2s"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::token::codec::SigningAlgorithm;

/// Secret shipped as the development default. Refused in production.
pub const DEVELOPMENT_SECRET: &str = "your-secret-key-change-in-production";

/// Minimum secret length accepted in production, in bytes.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Default `iss` claim value.
pub const DEFAULT_ISSUER: &str = "camarapsap";

/// Environment variable prefix for nested overrides (`CAMARA__JWT__SECRET_KEY`).
pub const ENV_PREFIX: &str = "CAMARA";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development; placeholder secrets are tolerated.
    #[default]
    Development,
    /// Production; the signing secret must be explicitly configured.
    Production,
}

/// Root configuration of the token core.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Deployment environment.
    pub environment: Environment,

    /// Token signing configuration.
    pub jwt: JwtConfig,

    /// Revocation store configuration.
    pub revocation: RevocationConfig,

    /// Client credential lookup configuration.
    pub credentials: CredentialsConfig,
}

/// Token signing and lifetime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Symmetric secret used to sign and verify tokens.
    /// Rotating it invalidates every outstanding token.
    pub secret_key: String,

    /// HMAC algorithm.
    pub algorithm: SigningAlgorithm,

    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime. No refresh flow consumes it yet.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Constant `iss` claim.
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret_key: DEVELOPMENT_SECRET.to_string(),
            algorithm: SigningAlgorithm::HS256,
            access_token_lifetime: Duration::from_secs(60 * 60),
            refresh_token_lifetime: Duration::from_secs(7 * 24 * 3600),
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }
}

/// Revocation store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RevocationConfig {
    /// Use the external store. When disabled an in-process store is used,
    /// which only suits single-instance deployments.
    pub enabled: bool,

    /// Connection string of the external key-value store.
    pub url: String,

    /// Connection pool size.
    pub pool_size: usize,

    /// Bound on every store round trip.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Prefix prepended to every revocation key.
    pub key_prefix: String,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "redis://localhost:6380/0".to_string(),
            pool_size: 10,
            timeout: Duration::from_secs(2),
            key_prefix: "revoked_token:".to_string(),
        }
    }
}

/// Client credential lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Bound on every credential lookup.
    #[serde(with = "humantime_serde")]
    pub lookup_timeout: Duration,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(2),
        }
    }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl AuthConfig {
    /// Loads configuration from an optional TOML file and the environment.
    ///
    /// Sources, lowest priority first:
    /// 1. built-in defaults
    /// 2. the TOML file at `path`, if it exists
    /// 3. `CAMARA__SECTION__KEY` variables
    /// 4. the flat variables `JWT_SECRET_KEY`, `JWT_ALGORITHM`,
    ///    `JWT_ACCESS_TOKEN_EXPIRE_MINUTES`, `JWT_REFRESH_TOKEN_EXPIRE_DAYS`
    ///    and `REDIS_URL`
    ///
    /// The result is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        use config::{Config, Environment as EnvSource, File};

        let mut builder = Config::builder();

        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(File::from(path));
            } else {
                tracing::warn!(path = %path.display(), "configuration file not found, using defaults");
            }
        }

        // Values stay strings; typed fields are converted on deserialize, so a
        // digit-only secret keeps its exact bytes.
        builder = builder.add_source(
            EnvSource::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

        builder = builder
            .set_override_option("jwt.secret_key", std::env::var("JWT_SECRET_KEY").ok())?
            .set_override_option("jwt.algorithm", std::env::var("JWT_ALGORITHM").ok())?
            .set_override_option(
                "jwt.access_token_lifetime",
                std::env::var("JWT_ACCESS_TOKEN_EXPIRE_MINUTES")
                    .ok()
                    .map(|minutes| format!("{}m", minutes.trim())),
            )?
            .set_override_option(
                "jwt.refresh_token_lifetime",
                std::env::var("JWT_REFRESH_TOKEN_EXPIRE_DAYS")
                    .ok()
                    .map(|days| format!("{}d", days.trim())),
            )?
            .set_override_option("revocation.url", std::env::var("REDIS_URL").ok())?;

        let config: AuthConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the secret is empty, and
    /// `ConfigError::InvalidValue` if:
    /// - the placeholder or a short secret is used in production
    /// - the access token lifetime is shorter than one second
    /// - the issuer is empty
    /// - a timeout or the pool size is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret_key.is_empty() {
            return Err(ConfigError::Missing("jwt.secret_key".to_string()));
        }

        if self.environment == Environment::Production {
            if self.jwt.secret_key == DEVELOPMENT_SECRET {
                return Err(ConfigError::InvalidValue(
                    "jwt.secret_key must be changed from the development default in production"
                        .to_string(),
                ));
            }
            if self.jwt.secret_key.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(ConfigError::InvalidValue(format!(
                    "jwt.secret_key must be at least {MIN_PRODUCTION_SECRET_LEN} bytes in production"
                )));
            }
        }

        // exp must be strictly greater than iat at whole-second resolution.
        if self.jwt.access_token_lifetime.as_secs() == 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.access_token_lifetime must be at least 1s".to_string(),
            ));
        }

        if self.jwt.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "jwt.issuer cannot be empty".to_string(),
            ));
        }

        if self.revocation.timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "revocation.timeout must be > 0".to_string(),
            ));
        }

        if self.revocation.pool_size == 0 {
            return Err(ConfigError::InvalidValue(
                "revocation.pool_size must be > 0".to_string(),
            ));
        }

        if self.credentials.lookup_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "credentials.lookup_timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.jwt.algorithm, SigningAlgorithm::HS256);
        assert_eq!(config.jwt.access_token_lifetime, Duration::from_secs(3600));
        assert_eq!(
            config.jwt.refresh_token_lifetime,
            Duration::from_secs(7 * 24 * 3600)
        );
        assert_eq!(config.jwt.issuer, "camarapsap");
        assert_eq!(config.revocation.key_prefix, "revoked_token:");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_rejects_placeholder_secret() {
        let mut config = AuthConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));

        config.jwt.secret_key = "short".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));

        config.jwt.secret_key = "0123456789abcdef0123456789abcdef".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_secret_is_missing() {
        let mut config = AuthConfig::default();
        config.jwt.secret_key.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        let mut config = AuthConfig::default();
        config.jwt.access_token_lifetime = Duration::from_millis(500);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = AuthConfig::default();
        config.revocation.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = AuthConfig::default();
        config.credentials.lookup_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    const LOAD_VARS: [&str; 10] = [
        "CAMARA__JWT__SECRET_KEY",
        "CAMARA__REVOCATION__POOL_SIZE",
        "CAMARA__REVOCATION__ENABLED",
        "CAMARA__ENVIRONMENT",
        "JWT_SECRET_KEY",
        "JWT_ALGORITHM",
        "JWT_ACCESS_TOKEN_EXPIRE_MINUTES",
        "JWT_REFRESH_TOKEN_EXPIRE_DAYS",
        "REDIS_URL",
        "CAMARA__JWT__ISSUER",
    ];

    fn set_env(vars: &[(&str, &str)]) {
        // SAFETY: only `test_load_from_environment` touches these variables.
        unsafe {
            for name in LOAD_VARS {
                std::env::remove_var(name);
            }
            for (name, value) in vars {
                std::env::set_var(name, value);
            }
        }
    }

    // Kept as one test: the process environment is shared between threads.
    #[test]
    fn test_load_from_environment() {
        set_env(&[
            ("CAMARA__JWT__SECRET_KEY", "00123456789012345678901234567890123"),
            ("CAMARA__REVOCATION__POOL_SIZE", "4"),
            ("CAMARA__REVOCATION__ENABLED", "false"),
        ]);
        let config = AuthConfig::load(None).unwrap();
        assert_eq!(config.jwt.secret_key, "00123456789012345678901234567890123");
        assert_eq!(config.revocation.pool_size, 4);
        assert!(!config.revocation.enabled);

        set_env(&[
            ("CAMARA__JWT__SECRET_KEY", "ignored-when-flat-variable-is-set"),
            ("JWT_SECRET_KEY", "00123"),
            ("JWT_ALGORITHM", "HS384"),
            ("JWT_ACCESS_TOKEN_EXPIRE_MINUTES", "1"),
            ("JWT_REFRESH_TOKEN_EXPIRE_DAYS", "2"),
            ("REDIS_URL", "redis://cache:6379/1"),
        ]);
        let config = AuthConfig::load(None).unwrap();
        assert_eq!(config.jwt.secret_key, "00123");
        assert_eq!(config.jwt.algorithm, SigningAlgorithm::HS384);
        assert_eq!(config.jwt.access_token_lifetime, Duration::from_secs(60));
        assert_eq!(
            config.jwt.refresh_token_lifetime,
            Duration::from_secs(2 * 24 * 3600)
        );
        assert_eq!(config.revocation.url, "redis://cache:6379/1");

        set_env(&[("JWT_ACCESS_TOKEN_EXPIRE_MINUTES", "0")]);
        assert!(AuthConfig::load(None).is_err());

        set_env(&[]);
        assert_eq!(AuthConfig::load(None).unwrap().jwt.secret_key, DEVELOPMENT_SECRET);
    }

    #[test]
    fn test_deserialize_toml() {
        let toml = r#"
            environment = "production"

            [jwt]
            secret_key = "0123456789abcdef0123456789abcdef"
            algorithm = "HS512"
            access_token_lifetime = "15m"

            [revocation]
            enabled = false
            timeout = "500ms"
        "#;

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config: AuthConfig = config::Config::builder()
            .add_source(config::File::from(file.path()))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.jwt.algorithm, SigningAlgorithm::HS512);
        assert_eq!(config.jwt.access_token_lifetime, Duration::from_secs(900));
        assert!(!config.revocation.enabled);
        assert_eq!(config.revocation.timeout, Duration::from_millis(500));
        // Untouched sections keep their defaults.
        assert_eq!(config.jwt.issuer, "camarapsap");
        assert_eq!(config.credentials.lookup_timeout, Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }
}
