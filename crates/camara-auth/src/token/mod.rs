//! Access token lifecycle.
//!
//! This module provides:
//!
//! - Signing and verification of compact JWS tokens ([`codec`])
//! - Claim construction for two- and three-legged flows ([`claims`])
//! - Issuance, validation, revocation and introspection ([`service`])

pub mod access;
pub mod claims;
pub mod codec;
pub mod response;
pub mod service;

pub use access::AccessToken;
pub use claims::{ClaimBuilder, ClaimSet, TokenType};
pub use codec::{CodecError, DecodeOptions, JwtCodec, SigningAlgorithm};
pub use response::{BEARER, IssuedToken, TokenResponse};
pub use service::{Introspection, IssueRequest, TokenConfig, TokenService};
