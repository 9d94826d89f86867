//! Issuance results.

use serde::{Deserialize, Serialize};

use crate::token::claims::ClaimSet;

/// Token type advertised in every token response.
pub const BEARER: &str = "Bearer";

/// A freshly issued token together with the claims it encodes.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    /// Encoded token.
    pub token: String,
    /// Claims encoded in `token`.
    pub claims: ClaimSet,
}

impl IssuedToken {
    /// Seconds of validity at issuance.
    #[must_use]
    pub fn expires_in(&self) -> u64 {
        self.claims.remaining_secs(self.claims.iat)
    }

    /// Builds the OAuth token endpoint response.
    #[must_use]
    pub fn to_response(&self) -> TokenResponse {
        TokenResponse {
            access_token: self.token.clone(),
            token_type: BEARER.to_string(),
            expires_in: self.expires_in(),
            scope: self.claims.scopes.join(" "),
        }
    }
}

/// OAuth 2.0 token endpoint response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Always `"Bearer"`.
    pub token_type: String,

    /// Seconds of validity at issuance.
    pub expires_in: u64,

    /// Granted scopes, space-separated.
    pub scope: String,
}
