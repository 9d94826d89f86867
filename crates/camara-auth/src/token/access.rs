//! Validated access tokens.

use time::OffsetDateTime;

use crate::device::Device;
use crate::scope::Scope;
use crate::token::claims::{ClaimSet, TokenType};

/// An access token that passed signature, expiry and revocation checks.
///
/// Only [`TokenService::validate`](crate::token::TokenService::validate)
/// produces values of this type, so holding one is proof of validation at the
/// time it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    raw: String,
    claims: ClaimSet,
}

impl AccessToken {
    pub(crate) fn new(raw: impl Into<String>, claims: ClaimSet) -> Self {
        Self {
            raw: raw.into(),
            claims,
        }
    }

    /// Returns the encoded token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the decoded claims.
    #[must_use]
    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    /// Consumes the token, returning its claims.
    #[must_use]
    pub fn into_claims(self) -> ClaimSet {
        self.claims
    }

    #[must_use]
    pub fn token_type(&self) -> TokenType {
        self.claims.token_type
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.claims.client_id
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.claims.user_id.as_deref()
    }

    #[must_use]
    pub fn device(&self) -> Option<&Device> {
        self.claims.device.as_ref()
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.claims.scopes
    }

    /// Returns `true` if the token grants `scope`.
    #[must_use]
    pub fn has_scope(&self, scope: Scope) -> bool {
        self.claims.has_scope(scope.as_str())
    }

    #[must_use]
    pub fn issued_at(&self) -> OffsetDateTime {
        self.claims.issued_at()
    }

    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.claims.expires_at()
    }
}
