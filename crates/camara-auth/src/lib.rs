//! # camara-auth
//!
//! OAuth 2.0 access token lifecycle for the CamaraPSAP device identifier and
//! location APIs.
//!
//! This crate provides:
//! - Signed bearer token issuance for two-legged (client credentials) and
//!   three-legged (authorization code) flows
//! - Validation with signature, expiry and shared revocation checks
//! - Revocation with entries that expire together with the token
//! - Scope and device authorization for validated tokens
//!
//! ## Overview
//!
//! Tokens are self-contained: a token that was never revoked validates without
//! any lookup beyond a single revocation probe. Revocation entries live in an
//! external store shared by all instances and expire when the token would.
//!
//! ## Modules
//!
//! - [`config`] - Configuration loading and validation
//! - [`token`] - Token encoding, claims, issuance, validation, revocation
//! - [`authorizer`] - Scope and device checks on validated tokens
//! - [`storage`] - Revocation store and credential lookup traits
//! - [`scope`] - The closed scope catalogue
//! - [`device`] - Device identifiers bound to three-legged tokens
//! - [`secret`] - Client secret generation and hashing

pub mod authorizer;
pub mod config;
pub mod device;
pub mod error;
pub mod scope;
pub mod secret;
pub mod storage;
pub mod token;

pub use authorizer::ScopeAuthorizer;
pub use config::{AuthConfig, ConfigError, Environment};
pub use device::{Device, DeviceIpv4Addr};
pub use error::{AuthError, ErrorBody, ErrorCategory};
pub use scope::Scope;
pub use storage::{
    ClientCredential, CredentialLookup, MemoryCredentialStore, MemoryRevocationStore,
    RevocationStore, revocation_key,
};
pub use token::{
    AccessToken, ClaimSet, Introspection, IssueRequest, IssuedToken, JwtCodec, SigningAlgorithm,
    TokenResponse, TokenService, TokenType,
};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use camara_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::authorizer::ScopeAuthorizer;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::device::Device;
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::scope::Scope;
    pub use crate::storage::{CredentialLookup, RevocationStore};
    pub use crate::token::{AccessToken, IssueRequest, IssuedToken, TokenService, TokenType};
}
