//! Signing codec for access tokens.
//!
//! Tokens are compact JWS strings: three dot-separated base64url segments
//! (header, payload, signature) signed with a process-wide symmetric secret.
//!
//! ## Supported Algorithms
//!
//! - **HS256**: HMAC with SHA-256 (default)
//! - **HS384**: HMAC with SHA-384
//! - **HS512**: HMAC with SHA-512
//!
//! The signature is verified before any claim is deserialized. Expiry is a
//! plain `now >= exp` comparison performed by this module rather than by
//! `jsonwebtoken`, whose check tolerates `exp == now`.
//!
//! ## Example
//!
//! ```ignore
//! use camara_auth::token::codec::{DecodeOptions, JwtCodec, SigningAlgorithm};
//!
//! let codec = JwtCodec::new(b"secret", SigningAlgorithm::HS256, "camarapsap");
//! let token = codec.encode(&claims)?;
//! let claims = codec.decode(&token, DecodeOptions::verify_expiry())?;
//! ```

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::JwtConfig;
use crate::error::AuthError;
use crate::token::claims::ClaimSet;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while encoding or decoding a token.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },

    /// The token structure or its claims cannot be parsed.
    #[error("Malformed token: {message}")]
    Malformed {
        /// Description of the structural problem.
        message: String,
    },

    /// The signature does not verify.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token has expired.
    #[error("Token expired")]
    Expired,
}

impl CodecError {
    /// Creates a new `Encoding` error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for CodecError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::malformed(err.to_string()),
        }
    }
}

impl From<CodecError> for AuthError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Malformed { message } => Self::Malformed { message },
            CodecError::InvalidSignature => Self::InvalidSignature,
            CodecError::Expired => Self::Expired,
            CodecError::Encoding { message } => Self::Internal { message },
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Symmetric signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    #[default]
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Decode Options
// ============================================================================

/// Controls which time checks [`JwtCodec::decode`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Fail with [`CodecError::Expired`] once `now >= exp`.
    pub verify_expiry: bool,
}

impl DecodeOptions {
    /// Full validation: signature, claims and expiry.
    #[must_use]
    pub fn verify_expiry() -> Self {
        Self {
            verify_expiry: true,
        }
    }

    /// Signature and claims only. Used by revocation and introspection,
    /// which need the claims of tokens that may already be expired.
    #[must_use]
    pub fn allow_expired() -> Self {
        Self {
            verify_expiry: false,
        }
    }
}

/// Returns `true` once a token expiring at `exp` is no longer usable at `now`.
#[must_use]
pub fn is_expired(exp: i64, now: i64) -> bool {
    now >= exp
}

// ============================================================================
// JWT Codec
// ============================================================================

/// Encodes and decodes signed access tokens.
///
/// The codec holds only immutable key material and is shared across tasks
/// behind an `Arc`.
pub struct JwtCodec {
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    /// Creates a codec for the given secret, algorithm and expected issuer.
    #[must_use]
    pub fn new(secret: &[u8], algorithm: SigningAlgorithm, issuer: &str) -> Self {
        let mut validation = Validation::new(algorithm.to_jwt_algorithm());
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Creates a codec from the signing section of the configuration.
    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            config.secret_key.as_bytes(),
            config.algorithm,
            &config.issuer,
        )
    }

    /// Returns the configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Encodes claims into a signed compact token.
    ///
    /// The output depends only on the claims, so identical claims (including
    /// timestamps) always produce the identical token.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be serialized.
    pub fn encode(&self, claims: &ClaimSet) -> Result<String, CodecError> {
        let header = Header::new(self.algorithm.to_jwt_algorithm());
        encode(&header, claims, &self.encoding_key).map_err(|e| CodecError::encoding(e.to_string()))
    }

    /// Verifies and decodes a token.
    ///
    /// # Errors
    /// - `InvalidSignature` if the signature does not verify
    /// - `Malformed` if the token or its claims cannot be parsed, the issuer
    ///   does not match, or the claim invariants do not hold
    /// - `Expired` if `options.verify_expiry` is set and `now >= exp`
    pub fn decode(&self, token: &str, options: DecodeOptions) -> Result<ClaimSet, CodecError> {
        self.decode_at(token, options, OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Like [`decode`](Self::decode), evaluating expiry against `now`.
    ///
    /// # Errors
    /// See [`decode`](Self::decode).
    pub fn decode_at(
        &self,
        token: &str,
        options: DecodeOptions,
        now: i64,
    ) -> Result<ClaimSet, CodecError> {
        let data = decode::<ClaimSet>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        claims.check_invariants().map_err(CodecError::malformed)?;

        if options.verify_expiry && is_expired(claims.exp, now) {
            return Err(CodecError::Expired);
        }

        Ok(claims)
    }
}

// ============================================================================
// Tests
// ============================================================================
