//! Authentication and authorization error types.
//!
//! This module defines every failure the token core can report. Token
//! validation failures (`Malformed`, `InvalidSignature`, `Expired`, `Revoked`)
//! stay distinguishable for server-side logging but collapse into a single
//! external shape, see [`AuthError::to_error_body`].

use std::fmt;

use serde::Serialize;

/// Message returned to callers for every token validation failure.
pub const UNAUTHENTICATED_MESSAGE: &str = "Invalid or expired access token";

/// Errors that can occur during token issuance, validation and authorization.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token cannot be parsed into header, payload and signature.
    #[error("Malformed token: {message}")]
    Malformed {
        /// Description of the structural problem.
        message: String,
    },

    /// The token signature does not verify against the configured secret.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The token has reached its `exp` time.
    #[error("Token expired")]
    Expired,

    /// A revocation entry exists for the token.
    #[error("Token revoked")]
    Revoked,

    /// The client credentials are invalid, unknown or the client is inactive.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// The requested scopes are unknown or none of them are granted.
    #[error("Invalid scope: {message}")]
    InvalidScope {
        /// Description of why the scope is invalid.
        message: String,
    },

    /// A three-legged token was requested without a user.
    #[error("Missing user identifier for 3-legged token")]
    MissingUser,

    /// The validated token does not hold the required scope.
    #[error("Insufficient scope: {required} required")]
    InsufficientScope {
        /// The scope that was required.
        required: String,
    },

    /// No device identifier is available for the request.
    #[error("Missing device identifier: {message}")]
    MissingIdentifier {
        /// Description of where the identifier was expected.
        message: String,
    },

    /// The request names a device although the token already binds one.
    #[error("Unnecessary device identifier: {message}")]
    UnnecessaryIdentifier {
        /// Description of the conflict.
        message: String,
    },

    /// An external collaborator (revocation store, credential lookup) is unreachable.
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Description of the failed dependency.
        message: String,
    },

    /// A collaborator answered with an unexpected error.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidScope` error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope {
            message: message.into(),
        }
    }

    /// Creates a new `InsufficientScope` error.
    #[must_use]
    pub fn insufficient_scope(required: impl Into<String>) -> Self {
        Self::InsufficientScope {
            required: required.into(),
        }
    }

    /// Creates a new `MissingIdentifier` error.
    #[must_use]
    pub fn missing_identifier(message: impl Into<String>) -> Self {
        Self::MissingIdentifier {
            message: message.into(),
        }
    }

    /// Creates a new `UnnecessaryIdentifier` error.
    #[must_use]
    pub fn unnecessary_identifier(message: impl Into<String>) -> Self {
        Self::UnnecessaryIdentifier {
            message: message.into(),
        }
    }

    /// Creates a new `ServiceUnavailable` error.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. }
                | Self::InvalidSignature
                | Self::Expired
                | Self::Revoked
                | Self::InvalidClient { .. }
                | Self::InvalidScope { .. }
                | Self::MissingUser
                | Self::InsufficientScope { .. }
                | Self::MissingIdentifier { .. }
                | Self::UnnecessaryIdentifier { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable { .. }
                | Self::Storage { .. }
                | Self::Configuration { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns `true` if the presented bearer token failed validation.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. } | Self::InvalidSignature | Self::Expired | Self::Revoked
        )
    }

    /// Returns `true` if the surrounding layer may retry with backoff.
    ///
    /// Only an unreachable collaborator qualifies.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Malformed { .. } | Self::InvalidSignature | Self::Expired | Self::Revoked => {
                ErrorCategory::Token
            }
            Self::InvalidClient { .. } => ErrorCategory::Authentication,
            Self::InvalidScope { .. } | Self::MissingUser => ErrorCategory::Validation,
            Self::InsufficientScope { .. } => ErrorCategory::Authorization,
            Self::MissingIdentifier { .. } | Self::UnnecessaryIdentifier { .. } => {
                ErrorCategory::Validation
            }
            Self::ServiceUnavailable { .. } | Self::Storage { .. } => {
                ErrorCategory::Infrastructure
            }
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } | Self::InvalidSignature | Self::Expired | Self::Revoked => {
                "invalid_token"
            }
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidScope { .. } => "invalid_scope",
            Self::MissingUser => "invalid_request",
            Self::InsufficientScope { .. } => "insufficient_scope",
            Self::MissingIdentifier { .. } | Self::UnnecessaryIdentifier { .. } => {
                "invalid_request"
            }
            Self::ServiceUnavailable { .. } => "temporarily_unavailable",
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                "server_error"
            }
        }
    }

    /// Returns the HTTP status the request-handling layer should answer with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Malformed { .. }
            | Self::InvalidSignature
            | Self::Expired
            | Self::Revoked
            | Self::InvalidClient { .. } => 401,
            Self::InvalidScope { .. } | Self::MissingUser => 400,
            Self::InsufficientScope { .. } => 403,
            Self::MissingIdentifier { .. } | Self::UnnecessaryIdentifier { .. } => 422,
            Self::ServiceUnavailable { .. } => 503,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => 500,
        }
    }

    /// Builds the externally visible error body.
    ///
    /// Token failures all render as the same `UNAUTHENTICATED` body so that an
    /// unauthenticated prober cannot tell a forged token from a revoked one.
    /// Server-side failures never leak their internal message.
    #[must_use]
    pub fn to_error_body(&self) -> ErrorBody {
        let status = self.http_status();
        let (code, message) = match self {
            Self::Malformed { .. } | Self::InvalidSignature | Self::Expired | Self::Revoked => {
                ("UNAUTHENTICATED", UNAUTHENTICATED_MESSAGE.to_string())
            }
            Self::InvalidClient { .. } => (
                "UNAUTHENTICATED",
                "Invalid client credentials".to_string(),
            ),
            Self::InvalidScope { message } => ("INVALID_ARGUMENT", message.clone()),
            Self::MissingUser => ("INVALID_ARGUMENT", self.to_string()),
            Self::InsufficientScope { required } => (
                "PERMISSION_DENIED",
                format!("Token missing required scope: {required}"),
            ),
            Self::MissingIdentifier { message } => ("MISSING_IDENTIFIER", message.clone()),
            Self::UnnecessaryIdentifier { message } => {
                ("UNNECESSARY_IDENTIFIER", message.clone())
            }
            Self::ServiceUnavailable { .. } => (
                "UNAVAILABLE",
                "Service temporarily unavailable, retry later".to_string(),
            ),
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                ("INTERNAL", "Internal server error".to_string())
            }
        };

        ErrorBody {
            status,
            code: code.to_string(),
            message,
        }
    }
}

/// CAMARA error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// HTTP status code.
    pub status: u16,
    /// CAMARA error code, e.g. `UNAUTHENTICATED`.
    pub code: String,
    /// Human-readable message safe to expose.
    pub message: String,
}

/// Categories of errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Client identity verification failures.
    Authentication,
    /// Permission checks on a valid token.
    Authorization,
    /// Bearer token validation failures.
    Token,
    /// Request validation errors.
    Validation,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
