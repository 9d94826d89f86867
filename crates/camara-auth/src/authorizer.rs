//! Scope and device authorization for validated tokens.
//!
//! Checks here run after [`TokenService::validate`](crate::token::TokenService::validate)
//! has succeeded and never re-check expiry or revocation.

use tracing::debug;

use crate::AuthResult;
use crate::device::Device;
use crate::error::AuthError;
use crate::scope::Scope;
use crate::token::access::AccessToken;
use crate::token::claims::TokenType;

/// Authorizes API calls made with a validated token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeAuthorizer;

impl ScopeAuthorizer {
    /// Allows the call if the token holds `required`.
    ///
    /// Scopes are compared as opaque strings: no hierarchy, no wildcards.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InsufficientScope` naming the missing scope.
    pub fn authorize(token: &AccessToken, required: Scope) -> AuthResult<()> {
        if token.has_scope(required) {
            return Ok(());
        }

        debug!(
            client_id = %token.client_id(),
            required = %required,
            "Token lacks required scope"
        );
        Err(AuthError::insufficient_scope(required.as_str()))
    }

    /// Allows the call if the token holds every scope in `required`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InsufficientScope` for the first missing scope.
    pub fn authorize_all(token: &AccessToken, required: &[Scope]) -> AuthResult<()> {
        required
            .iter()
            .try_for_each(|scope| Self::authorize(token, *scope))
    }

    /// Determines which device an API call concerns.
    ///
    /// A two-legged token names no device, so the request must. A three-legged
    /// token already binds the consenting user's device; the request may omit
    /// it or repeat it unchanged, but may not name another one.
    ///
    /// # Errors
    ///
    /// - `MissingIdentifier` if neither the token nor the request names a device
    /// - `UnnecessaryIdentifier` if the request names a device different from
    ///   the one bound to a three-legged token
    pub fn resolve_device(
        token: &AccessToken,
        request_device: Option<&Device>,
    ) -> AuthResult<Device> {
        match token.token_type() {
            TokenType::TwoLegged => request_device.cloned().ok_or_else(|| {
                AuthError::missing_identifier(
                    "The device cannot be identified from the access token and none was provided",
                )
            }),
            TokenType::ThreeLegged => match (token.device(), request_device) {
                (Some(bound), Some(requested)) if bound != requested => {
                    Err(AuthError::unnecessary_identifier(
                        "The device is already identified by the access token",
                    ))
                }
                (Some(bound), _) => Ok(bound.clone()),
                (None, Some(requested)) => Ok(requested.clone()),
                (None, None) => Err(AuthError::missing_identifier(
                    "The device cannot be identified from the access token and none was provided",
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::claims::ClaimBuilder;
    use std::time::Duration;

    const NOW: i64 = 1_700_000_000;

    fn builder() -> ClaimBuilder {
        ClaimBuilder::with_lifetime("camarapsap", Duration::from_secs(3600))
    }

    fn two_legged(scopes: &[Scope]) -> AccessToken {
        AccessToken::new("a.b.c", builder().two_legged_at("acme", scopes, NOW))
    }

    fn three_legged(scopes: &[Scope], device: Option<Device>) -> AccessToken {
        let claims = builder()
            .three_legged_at("acme", "user-42", scopes, device, NOW)
            .unwrap();
        AccessToken::new("a.b.c", claims)
    }

    #[test]
    fn test_authorize_exact_match() {
        let token = two_legged(&[Scope::LocationRetrievalRead]);
        assert!(ScopeAuthorizer::authorize(&token, Scope::LocationRetrievalRead).is_ok());
    }

    #[test]
    fn test_authorize_insufficient_scope() {
        let token = three_legged(&[Scope::LocationVerificationVerify], None);

        let err = ScopeAuthorizer::authorize(&token, Scope::LocationRetrievalRead).unwrap_err();
        match err {
            AuthError::InsufficientScope { ref required } => {
                assert_eq!(required, "location-retrieval:read");
            }
            ref other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_error_body().status, 403);
    }

    #[test]
    fn test_authorize_no_scopes() {
        let token = two_legged(&[]);
        for scope in Scope::ALL {
            assert!(ScopeAuthorizer::authorize(&token, scope).is_err());
        }
    }

    #[test]
    fn test_authorize_all() {
        let token = two_legged(&[
            Scope::DeviceIdentifierRetrieveIdentifier,
            Scope::DeviceIdentifierRetrieveType,
        ]);

        assert!(
            ScopeAuthorizer::authorize_all(
                &token,
                &[
                    Scope::DeviceIdentifierRetrieveType,
                    Scope::DeviceIdentifierRetrieveIdentifier
                ]
            )
            .is_ok()
        );
        assert!(ScopeAuthorizer::authorize_all(&token, &[]).is_ok());
        assert!(matches!(
            ScopeAuthorizer::authorize_all(
                &token,
                &[
                    Scope::DeviceIdentifierRetrieveType,
                    Scope::DeviceIdentifierRetrievePpid
                ]
            ),
            Err(AuthError::InsufficientScope { required }) if required == "device-identifier:retrieve-ppid"
        ));
    }

    #[test]
    fn test_resolve_device_two_legged() {
        let token = two_legged(&[]);
        let device = Device::with_phone_number("+1234567890");

        assert_eq!(
            ScopeAuthorizer::resolve_device(&token, Some(&device)).unwrap(),
            device
        );
        assert!(matches!(
            ScopeAuthorizer::resolve_device(&token, None),
            Err(AuthError::MissingIdentifier { .. })
        ));
    }

    #[test]
    fn test_resolve_device_three_legged() {
        let bound = Device::with_phone_number("+1234567890");
        let token = three_legged(&[], Some(bound.clone()));

        assert_eq!(ScopeAuthorizer::resolve_device(&token, None).unwrap(), bound);
        assert_eq!(
            ScopeAuthorizer::resolve_device(&token, Some(&bound)).unwrap(),
            bound
        );

        let other = Device::with_phone_number("+1999999999");
        let err = ScopeAuthorizer::resolve_device(&token, Some(&other)).unwrap_err();
        assert!(matches!(err, AuthError::UnnecessaryIdentifier { .. }));
        assert_eq!(err.to_error_body().code, "UNNECESSARY_IDENTIFIER");
    }

    #[test]
    fn test_resolve_device_three_legged_without_bound_device() {
        let token = three_legged(&[], None);
        let device = Device::with_phone_number("+1234567890");

        assert_eq!(
            ScopeAuthorizer::resolve_device(&token, Some(&device)).unwrap(),
            device
        );
        assert!(matches!(
            ScopeAuthorizer::resolve_device(&token, None),
            Err(AuthError::MissingIdentifier { .. })
        ));
    }
}
