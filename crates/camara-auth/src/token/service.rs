//! Token service: issuance, validation, revocation.
//!
//! The service owns no mutable state. Signing material is immutable and the
//! revocation set lives in an external [`RevocationStore`], so any number of
//! instances can share one store and agree on what is revoked.
//!
//! Every collaborator call is bounded by a timeout. A revocation store that
//! cannot answer during validation makes validation fail with
//! `ServiceUnavailable`; a token is never accepted without a definitive
//! "not revoked" answer.
//!
//! # Usage
//!
//! ```ignore
//! use camara_auth::token::{IssueRequest, TokenService};
//!
//! let service = TokenService::from_config(&config, credentials, revocations);
//!
//! let issued = service.issue(IssueRequest::TwoLegged { .. }).await?;
//! let token = service.validate(&issued.token).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::device::Device;
use crate::error::AuthError;
use crate::scope::Scope;
use crate::secret::{verify_client_secret, verify_unknown_client};
use crate::storage::client::{ClientCredential, CredentialLookup};
use crate::storage::revocation::{RevocationStore, revocation_key};
use crate::token::access::AccessToken;
use crate::token::claims::{ClaimBuilder, ClaimSet, TokenType};
use crate::token::codec::{DecodeOptions, JwtCodec, is_expired};
use crate::token::response::IssuedToken;

/// Reason given for every failed client authentication.
const INVALID_CREDENTIALS: &str = "Invalid client credentials";

/// Configuration for the token service.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Constant `iss` claim.
    pub issuer: String,

    /// Access token lifetime.
    pub access_token_lifetime: Duration,

    /// Prefix of every revocation key.
    pub revocation_key_prefix: String,

    /// Bound on each revocation store call.
    pub store_timeout: Duration,

    /// Bound on each credential lookup.
    pub lookup_timeout: Duration,
}

impl TokenConfig {
    /// Extracts the service settings from the root configuration.
    #[must_use]
    pub fn from_auth_config(config: &AuthConfig) -> Self {
        Self {
            issuer: config.jwt.issuer.clone(),
            access_token_lifetime: config.jwt.access_token_lifetime,
            revocation_key_prefix: config.revocation.key_prefix.clone(),
            store_timeout: config.revocation.timeout,
            lookup_timeout: config.credentials.lookup_timeout,
        }
    }
}

/// A request to issue an access token.
#[derive(Debug, Clone)]
pub enum IssueRequest {
    /// Client credentials flow.
    TwoLegged {
        /// OAuth client ID.
        client_id: String,
        /// Plaintext client secret, checked against the stored hash.
        client_secret: String,
        /// Requested scopes, narrowed to those the client may be granted.
        scopes: Vec<Scope>,
    },

    /// Authorization code flow, after the user has consented.
    ///
    /// The caller exchanges the authorization code for `user_id` and `device`
    /// before issuance; this service only assembles and signs the claims.
    /// The secret is optional because that exchange has already
    /// authenticated the client; when given it is verified.
    ThreeLegged {
        /// OAuth client ID.
        client_id: String,
        /// Plaintext client secret, verified when present.
        client_secret: Option<String>,
        /// Authorization code the caller exchanged. Not interpreted here.
        authorization_code: Option<String>,
        /// User who consented. Becomes `sub`.
        user_id: String,
        /// Device of the consenting user, stored verbatim.
        device: Option<Device>,
        /// Requested scopes, narrowed to those the client may be granted.
        scopes: Vec<Scope>,
    },
}

impl IssueRequest {
    /// Returns the flow this request is for.
    #[must_use]
    pub fn token_type(&self) -> TokenType {
        match self {
            Self::TwoLegged { .. } => TokenType::TwoLegged,
            Self::ThreeLegged { .. } => TokenType::ThreeLegged,
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        match self {
            Self::TwoLegged { client_id, .. } | Self::ThreeLegged { client_id, .. } => client_id,
        }
    }
}

/// Outcome of inspecting a token whose signature verified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Introspection {
    /// `true` if the token would pass [`TokenService::validate`].
    pub active: bool,
    /// `true` once `now >= exp`.
    pub expired: bool,
    /// `true` if a revocation entry exists for the token.
    pub revoked: bool,
    /// Decoded claims, trusted because the signature verified.
    pub claims: ClaimSet,
}

/// Token service for issuing, validating and revoking access tokens.
pub struct TokenService {
    /// Codec for signing and verifying tokens.
    codec: Arc<JwtCodec>,

    /// Builder stamping issuer and lifetime.
    claims: ClaimBuilder,

    /// Registered clients.
    credentials: Arc<dyn CredentialLookup>,

    /// Shared revocation entries.
    revocations: Arc<dyn RevocationStore>,

    /// Service configuration.
    config: TokenConfig,
}

impl TokenService {
    /// Creates a new token service.
    #[must_use]
    pub fn new(
        codec: Arc<JwtCodec>,
        credentials: Arc<dyn CredentialLookup>,
        revocations: Arc<dyn RevocationStore>,
        config: TokenConfig,
    ) -> Self {
        Self {
            codec,
            claims: ClaimBuilder::with_lifetime(
                config.issuer.clone(),
                config.access_token_lifetime,
            ),
            credentials,
            revocations,
            config,
        }
    }

    /// Creates a service from validated root configuration.
    #[must_use]
    pub fn from_config(
        config: &AuthConfig,
        credentials: Arc<dyn CredentialLookup>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        Self::new(
            Arc::new(JwtCodec::from_config(&config.jwt)),
            credentials,
            revocations,
            TokenConfig::from_auth_config(config),
        )
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    // ========================================================================
    // Issuance
    // ========================================================================

    /// Issues an access token.
    ///
    /// Requested scopes are narrowed to those the client may be granted.
    /// Requesting no scopes yields a token with an empty scope list.
    ///
    /// # Errors
    ///
    /// - `InvalidClient` if the client is unknown, inactive, or the secret
    ///   does not match
    /// - `InvalidScope` if scopes were requested and none can be granted
    /// - `MissingUser` for a three-legged request with an empty user
    /// - `ServiceUnavailable` if the credential lookup times out
    pub async fn issue(&self, request: IssueRequest) -> AuthResult<IssuedToken> {
        let claims = match request {
            IssueRequest::TwoLegged {
                client_id,
                client_secret,
                scopes,
            } => {
                let client = self.authenticate_client(&client_id, &client_secret).await?;
                let granted = grant_scopes(&client, &scopes)?;
                self.claims.two_legged(&client.client_id, &granted)
            }
            IssueRequest::ThreeLegged {
                client_id,
                client_secret,
                authorization_code: _,
                user_id,
                device,
                scopes,
            } => {
                if user_id.is_empty() {
                    return Err(AuthError::MissingUser);
                }
                let client = match client_secret {
                    Some(secret) => self.authenticate_client(&client_id, &secret).await?,
                    None => self.find_active_client(&client_id).await?,
                };
                let granted = grant_scopes(&client, &scopes)?;
                self.claims
                    .three_legged(&client.client_id, &user_id, &granted, device)?
            }
        };

        let token = self
            .codec
            .encode(&claims)
            .map_err(|e| AuthError::internal(e.to_string()))?;

        info!(
            client_id = %claims.client_id,
            token_type = %claims.token_type,
            scopes = %claims.scopes.join(" "),
            exp = claims.exp,
            "Access token issued"
        );

        Ok(IssuedToken { token, claims })
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validates a bearer token.
    ///
    /// Checks, in order: structure and signature, expiry, revocation. The
    /// revocation store is consulted only for tokens that pass the first two.
    ///
    /// # Errors
    ///
    /// - `Malformed`, `InvalidSignature`, `Expired`, `Revoked` for a token that
    ///   must not be accepted
    /// - `ServiceUnavailable` if revocation status cannot be determined
    pub async fn validate(&self, token: &str) -> AuthResult<AccessToken> {
        let claims = self
            .codec
            .decode(token, DecodeOptions::verify_expiry())
            .map_err(|e| {
                let err = AuthError::from(e);
                debug!(reason = %err, "Token rejected");
                err
            })?;

        if self.is_revoked(token).await? {
            info!(client_id = %claims.client_id, "Revoked token presented");
            return Err(AuthError::Revoked);
        }

        Ok(AccessToken::new(token, claims))
    }

    /// Returns the device bound to a valid token.
    ///
    /// Two-legged tokens never carry a device, so this yields `None` for them.
    ///
    /// # Errors
    ///
    /// Any error from [`validate`](Self::validate).
    pub async fn device_for(&self, token: &str) -> AuthResult<Option<Device>> {
        let token = self.validate(token).await?;
        Ok(match token.token_type() {
            TokenType::ThreeLegged => token.into_claims().device,
            TokenType::TwoLegged => None,
        })
    }

    /// Decodes a token without rejecting it for expiry or revocation and
    /// reports its status.
    ///
    /// # Errors
    ///
    /// - `Malformed` or `InvalidSignature` if the token cannot be trusted
    /// - `ServiceUnavailable` if revocation status cannot be determined
    pub async fn introspect(&self, token: &str) -> AuthResult<Introspection> {
        let claims = self.codec.decode(token, DecodeOptions::allow_expired())?;
        let expired = is_expired(claims.exp, OffsetDateTime::now_utc().unix_timestamp());
        let revoked = self.is_revoked(token).await?;

        Ok(Introspection {
            active: !expired && !revoked,
            expired,
            revoked,
            claims,
        })
    }

    // ========================================================================
    // Revocation
    // ========================================================================

    /// Revokes a token on behalf of the client it was issued to.
    ///
    /// Returns `Ok(false)` for a token that cannot be decoded or whose
    /// signature does not verify; nothing is recorded. Returns `Ok(true)` once
    /// the revocation is recorded, or immediately for an already expired
    /// token. Revoking twice is harmless.
    ///
    /// # Errors
    ///
    /// - `InvalidClient` if the caller fails authentication or the token was
    ///   issued to a different client
    /// - `ServiceUnavailable` if the store cannot record the entry
    pub async fn revoke(
        &self,
        token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> AuthResult<bool> {
        let client = self.authenticate_client(client_id, client_secret).await?;

        let claims = match self.codec.decode(token, DecodeOptions::allow_expired()) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(client_id = %client.client_id, reason = %e, "Revocation of undecodable token ignored");
                return Ok(false);
            }
        };

        if claims.client_id != client.client_id {
            warn!(
                client_id = %client.client_id,
                token_client_id = %claims.client_id,
                "Client attempted to revoke a token issued to another client"
            );
            return Err(AuthError::invalid_client(
                "Token was not issued to this client",
            ));
        }

        let ttl = claims.remaining_secs(OffsetDateTime::now_utc().unix_timestamp());
        if ttl == 0 {
            debug!(client_id = %client.client_id, "Token already expired, nothing to record");
            return Ok(true);
        }

        let key = revocation_key(&self.config.revocation_key_prefix, token);
        bounded(
            "revocation store",
            self.config.store_timeout,
            self.revocations.set(&key, ttl),
        )
        .await
        .inspect_err(|e| {
            warn!(client_id = %client.client_id, error = %e, "Failed to record revocation");
        })?;

        info!(client_id = %client.client_id, ttl_secs = ttl, "Access token revoked");
        Ok(true)
    }

    /// Checks whether a revocation entry exists for `token`.
    ///
    /// Any string can be checked; the token is not decoded.
    ///
    /// # Errors
    ///
    /// Returns `ServiceUnavailable` if the store cannot answer.
    pub async fn is_revoked(&self, token: &str) -> AuthResult<bool> {
        let key = revocation_key(&self.config.revocation_key_prefix, token);
        bounded(
            "revocation store",
            self.config.store_timeout,
            self.revocations.exists(&key),
        )
        .await
        .inspect_err(|e| warn!(error = %e, "Revocation status unavailable"))
    }

    // ========================================================================
    // Client authentication
    // ========================================================================

    async fn find_active_client(&self, client_id: &str) -> AuthResult<ClientCredential> {
        let client = bounded(
            "credential lookup",
            self.config.lookup_timeout,
            self.credentials.find_client(client_id),
        )
        .await?;

        match client {
            Some(client) if client.active => Ok(client),
            Some(_) => {
                warn!(client_id, reason = "inactive", "Client authentication failed");
                Err(AuthError::invalid_client("Client is inactive"))
            }
            None => {
                warn!(client_id, reason = "unknown", "Client authentication failed");
                Err(AuthError::invalid_client("Client not found"))
            }
        }
    }

    async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> AuthResult<ClientCredential> {
        let client = match self.find_active_client(client_id).await {
            Ok(client) => client,
            Err(AuthError::InvalidClient { .. }) => {
                verify_unknown_client(client_secret);
                return Err(AuthError::invalid_client(INVALID_CREDENTIALS));
            }
            Err(e) => return Err(e),
        };

        let verified =
            verify_client_secret(client_secret, &client.secret_hash).unwrap_or_else(|e| {
                warn!(client_id, error = %e, "Stored client secret hash is unreadable");
                false
            });

        if !verified {
            warn!(client_id, reason = "secret_mismatch", "Client authentication failed");
            return Err(AuthError::invalid_client(INVALID_CREDENTIALS));
        }

        Ok(client)
    }
}

/// Runs a collaborator call under `limit`.
async fn bounded<T>(
    collaborator: &str,
    limit: Duration,
    call: impl Future<Output = AuthResult<T>>,
) -> AuthResult<T> {
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::service_unavailable(format!(
            "{collaborator} timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

/// Narrows requested scopes to those the client may be granted.
fn grant_scopes(client: &ClientCredential, requested: &[Scope]) -> AuthResult<Vec<Scope>> {
    let granted = client.grantable_scopes(requested);

    if !requested.is_empty() && granted.is_empty() {
        warn!(client_id = %client.client_id, "No requested scope is allowed for client");
        return Err(AuthError::invalid_scope(
            "Client not authorized for requested scopes",
        ));
    }

    if granted.len() < requested.len() {
        debug!(
            client_id = %client.client_id,
            requested = requested.len(),
            granted = granted.len(),
            "Requested scopes narrowed"
        );
    }

    Ok(granted)
}

// ============================================================================
// Tests
// ============================================================================
