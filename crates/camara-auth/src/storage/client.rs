//! Client credential lookup.
//!
//! Registered clients are looked up by `client_id` during issuance and
//! revocation. How clients are registered is outside the token core.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::scope::Scope;

/// A registered OAuth client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredential {
    /// OAuth client identifier.
    pub client_id: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Argon2id PHC hash of the client secret.
    pub secret_hash: String,

    /// Scopes the client may be granted.
    #[serde(default)]
    pub allowed_scopes: Vec<Scope>,

    /// Inactive clients cannot obtain or revoke tokens.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ClientCredential {
    /// Returns `true` if the client may be granted `scope`.
    #[must_use]
    pub fn is_scope_allowed(&self, scope: Scope) -> bool {
        self.allowed_scopes.contains(&scope)
    }

    /// Keeps the requested scopes the client may be granted, in request order.
    #[must_use]
    pub fn grantable_scopes(&self, requested: &[Scope]) -> Vec<Scope> {
        requested
            .iter()
            .copied()
            .filter(|scope| self.is_scope_allowed(*scope))
            .collect()
    }
}

/// Lookup of registered clients.
///
/// # Example
///
/// ```ignore
/// use camara_auth::storage::CredentialLookup;
///
/// async fn example(lookup: &impl CredentialLookup) -> camara_auth::AuthResult<()> {
///     if let Some(client) = lookup.find_client("acme").await? {
///         println!("{} active={}", client.client_id, client.active);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait CredentialLookup: Send + Sync {
    /// Finds a client by `client_id`, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be queried.
    async fn find_client(&self, client_id: &str) -> AuthResult<Option<ClientCredential>>;
}
