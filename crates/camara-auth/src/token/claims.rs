//! Access token claims and their construction.
//!
//! [`ClaimSet`] is the exact payload carried inside a signed token. Its field
//! names are the wire names, so the serialized form is the payload verbatim.
//! [`ClaimBuilder`] stamps issuance and expiry times and normalizes scopes; it
//! performs no authorization and trusts its caller.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::JwtConfig;
use crate::device::Device;
use crate::error::AuthError;
use crate::scope::Scope;

/// OAuth flow a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Client credentials flow. The token authorizes the client itself.
    #[serde(rename = "2-legged")]
    TwoLegged,
    /// Authorization code flow. The token acts on behalf of a user and may
    /// bind the user's device.
    #[serde(rename = "3-legged")]
    ThreeLegged,
}

impl TokenType {
    /// Returns the wire identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoLegged => "2-legged",
            Self::ThreeLegged => "3-legged",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Subject: the client id for two-legged tokens, the user id otherwise.
    pub sub: String,

    /// Client the token was issued to.
    pub client_id: String,

    /// Flow the token was issued for.
    pub token_type: TokenType,

    /// Granted scopes, de-duplicated, in request order.
    pub scopes: Vec<String>,

    /// User on whose behalf a three-legged token acts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Device bound at consent time (three-legged only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issuer.
    pub iss: String,
}

impl ClaimSet {
    /// Returns the issuance time.
    #[must_use]
    pub fn issued_at(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.iat).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// Returns the expiration time.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.exp).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// Seconds until expiry at `now`, never negative.
    #[must_use]
    pub fn remaining_secs(&self, now: i64) -> u64 {
        u64::try_from(self.exp.saturating_sub(now)).unwrap_or(0)
    }

    /// Returns `true` if the scope list contains `scope` verbatim.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Checks the structural invariants every issued token satisfies.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.exp <= self.iat {
            return Err("exp must be after iat".to_string());
        }

        match self.token_type {
            TokenType::ThreeLegged if self.user_id.as_deref().is_none_or(str::is_empty) => {
                Err("3-legged token without user_id".to_string())
            }
            TokenType::TwoLegged if self.user_id.is_some() || self.device.is_some() => {
                Err("2-legged token with user context".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Builds claim sets with consistent issuer and lifetime.
#[derive(Debug, Clone)]
pub struct ClaimBuilder {
    issuer: String,
    lifetime: Duration,
}

impl ClaimBuilder {
    /// Creates a builder from the signing configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self::with_lifetime(config.issuer.clone(), config.access_token_lifetime)
    }

    /// Creates a builder with an explicit issuer and lifetime.
    #[must_use]
    pub fn with_lifetime(issuer: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            issuer: issuer.into(),
            lifetime,
        }
    }

    /// Returns the configured token lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Builds a two-legged claim set issued now.
    #[must_use]
    pub fn two_legged(&self, client_id: &str, scopes: &[Scope]) -> ClaimSet {
        self.two_legged_at(client_id, scopes, OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Builds a two-legged claim set issued at `now`.
    #[must_use]
    pub fn two_legged_at(&self, client_id: &str, scopes: &[Scope], now: i64) -> ClaimSet {
        ClaimSet {
            sub: client_id.to_string(),
            client_id: client_id.to_string(),
            token_type: TokenType::TwoLegged,
            scopes: dedup_scopes(scopes),
            user_id: None,
            device: None,
            iat: now,
            exp: self.expiry(now),
            iss: self.issuer.clone(),
        }
    }

    /// Builds a three-legged claim set issued now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingUser` if `user_id` is empty.
    pub fn three_legged(
        &self,
        client_id: &str,
        user_id: &str,
        scopes: &[Scope],
        device: Option<Device>,
    ) -> Result<ClaimSet, AuthError> {
        self.three_legged_at(
            client_id,
            user_id,
            scopes,
            device,
            OffsetDateTime::now_utc().unix_timestamp(),
        )
    }

    /// Builds a three-legged claim set issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingUser` if `user_id` is empty.
    pub fn three_legged_at(
        &self,
        client_id: &str,
        user_id: &str,
        scopes: &[Scope],
        device: Option<Device>,
        now: i64,
    ) -> Result<ClaimSet, AuthError> {
        if user_id.is_empty() {
            return Err(AuthError::MissingUser);
        }

        Ok(ClaimSet {
            sub: user_id.to_string(),
            client_id: client_id.to_string(),
            token_type: TokenType::ThreeLegged,
            scopes: dedup_scopes(scopes),
            user_id: Some(user_id.to_string()),
            device,
            iat: now,
            exp: self.expiry(now),
            iss: self.issuer.clone(),
        })
    }

    fn expiry(&self, now: i64) -> i64 {
        // Validated config guarantees at least one second.
        let secs = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX).max(1);
        now.saturating_add(secs)
    }
}

fn dedup_scopes(scopes: &[Scope]) -> Vec<String> {
    let mut seen = HashSet::new();
    scopes
        .iter()
        .filter(|scope| seen.insert(**scope))
        .map(|scope| scope.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn builder() -> ClaimBuilder {
        ClaimBuilder::with_lifetime("camarapsap", Duration::from_secs(3600))
    }

    #[test]
    fn test_two_legged_claims() {
        let claims = builder().two_legged_at("acme", &[Scope::LocationRetrievalRead], NOW);

        assert_eq!(claims.sub, "acme");
        assert_eq!(claims.client_id, "acme");
        assert_eq!(claims.token_type, TokenType::TwoLegged);
        assert_eq!(claims.scopes, vec!["location-retrieval:read"]);
        assert!(claims.user_id.is_none());
        assert!(claims.device.is_none());
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + 3600);
        assert_eq!(claims.iss, "camarapsap");
        assert!(claims.check_invariants().is_ok());
    }

    #[test]
    fn test_three_legged_claims() {
        let device = Device::with_phone_number("+1234567890");
        let claims = builder()
            .three_legged_at(
                "acme",
                "user-42",
                &[Scope::DeviceIdentifierRetrieveIdentifier],
                Some(device.clone()),
                NOW,
            )
            .unwrap();

        assert_eq!(claims.sub, "user-42");
        assert_eq!(claims.client_id, "acme");
        assert_eq!(claims.token_type, TokenType::ThreeLegged);
        assert_eq!(claims.user_id.as_deref(), Some("user-42"));
        assert_eq!(claims.device, Some(device));
        assert!(claims.check_invariants().is_ok());
    }

    #[test]
    fn test_three_legged_requires_user() {
        let result = builder().three_legged_at("acme", "", &[], None, NOW);
        assert!(matches!(result, Err(AuthError::MissingUser)));
    }

    #[test]
    fn test_scopes_deduplicated_in_order() {
        let claims = builder().two_legged_at(
            "acme",
            &[
                Scope::LocationVerificationVerify,
                Scope::LocationRetrievalRead,
                Scope::LocationVerificationVerify,
            ],
            NOW,
        );
        assert_eq!(
            claims.scopes,
            vec!["location-verification:verify", "location-retrieval:read"]
        );
    }

    #[test]
    fn test_empty_scopes_allowed() {
        let claims = builder().two_legged_at("acme", &[], NOW);
        assert!(claims.scopes.is_empty());
    }

    #[test]
    fn test_builder_from_config() {
        let config = JwtConfig {
            access_token_lifetime: Duration::from_secs(90),
            ..Default::default()
        };
        let builder = ClaimBuilder::new(&config);
        assert_eq!(builder.lifetime(), Duration::from_secs(90));

        let claims = builder.two_legged_at("acme", &[], NOW);
        assert_eq!(claims.exp - claims.iat, 90);
    }

    #[test]
    fn test_remaining_secs() {
        let claims = builder().two_legged_at("acme", &[], NOW);
        assert_eq!(claims.remaining_secs(NOW), 3600);
        assert_eq!(claims.remaining_secs(NOW + 3599), 1);
        assert_eq!(claims.remaining_secs(NOW + 3600), 0);
        assert_eq!(claims.remaining_secs(NOW + 10_000), 0);
    }

    #[test]
    fn test_invariant_violations() {
        let mut claims = builder().two_legged_at("acme", &[], NOW);
        claims.exp = claims.iat;
        assert!(claims.check_invariants().is_err());

        let mut claims = builder().two_legged_at("acme", &[], NOW);
        claims.device = Some(Device::with_phone_number("+1234567890"));
        assert!(claims.check_invariants().is_err());

        let mut claims = builder()
            .three_legged_at("acme", "user-42", &[], None, NOW)
            .unwrap();
        claims.user_id = None;
        assert!(claims.check_invariants().is_err());
    }

    #[test]
    fn test_token_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&TokenType::TwoLegged).unwrap(),
            "\"2-legged\""
        );
        let parsed: TokenType = serde_json::from_str("\"3-legged\"").unwrap();
        assert_eq!(parsed, TokenType::ThreeLegged);
        assert_eq!(TokenType::ThreeLegged.to_string(), "3-legged");
    }

    #[test]
    fn test_has_scope_is_exact() {
        let claims = builder().two_legged_at("acme", &[Scope::LocationRetrievalRead], NOW);
        assert!(claims.has_scope("location-retrieval:read"));
        assert!(!claims.has_scope("location-retrieval"));
        assert!(!claims.has_scope("location-retrieval:*"));
    }
}
