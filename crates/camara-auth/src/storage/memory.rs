//! In-process storage backends.
//!
//! Both stores are lock-free maps suitable for tests, the CLI, and
//! single-instance deployments. Revocations recorded here are not visible to
//! other processes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::AuthResult;
use crate::storage::client::{ClientCredential, CredentialLookup};
use crate::storage::revocation::RevocationStore;

/// Writes between two sweeps of expired revocation entries.
pub const DEFAULT_PURGE_INTERVAL: usize = 1024;

/// Revocation store backed by a `DashMap`.
///
/// Expired entries are dropped when probed, and every `purge_interval`
/// writes the whole map is swept, so entries for tokens that are never
/// presented again do not accumulate.
#[derive(Debug, Clone)]
pub struct MemoryRevocationStore {
    entries: Arc<DashMap<String, Instant>>,
    writes: Arc<AtomicUsize>,
    purge_interval: usize,
}

impl Default for MemoryRevocationStore {
    fn default() -> Self {
        Self::with_purge_interval(DEFAULT_PURGE_INTERVAL)
    }
}

impl MemoryRevocationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that sweeps expired entries every `interval` writes.
    #[must_use]
    pub fn with_purge_interval(interval: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            writes: Arc::new(AtomicUsize::new(0)),
            purge_interval: interval.max(1),
        }
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes expired entries and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn set(&self, key: &str, ttl_secs: u64) -> AuthResult<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .entry(key.to_string())
            .and_modify(|current| *current = (*current).max(expires_at))
            .or_insert(expires_at);

        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % self.purge_interval == 0 {
            let purged = self.purge_expired();
            if purged > 0 {
                tracing::debug!(
                    purged,
                    remaining = self.entries.len(),
                    "Expired revocations purged"
                );
            }
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> AuthResult<bool> {
        let now = Instant::now();
        // remove_if avoids holding a read guard while removing.
        if self
            .entries
            .remove_if(key, |_, expires_at| *expires_at <= now)
            .is_some()
        {
            return Ok(false);
        }
        Ok(self.entries.contains_key(key))
    }
}

/// Credential lookup backed by an in-process map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    clients: Arc<DashMap<String, ClientCredential>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `clients`. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_credentials(clients: impl IntoIterator<Item = ClientCredential>) -> Self {
        let store = Self::new();
        for client in clients {
            store.insert(client);
        }
        store
    }

    /// Registers or replaces a client.
    pub fn insert(&self, client: ClientCredential) {
        self.clients.insert(client.client_id.clone(), client);
    }

    /// Removes a client, returning it if it was registered.
    pub fn remove(&self, client_id: &str) -> Option<ClientCredential> {
        self.clients.remove(client_id).map(|(_, client)| client)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl CredentialLookup for MemoryCredentialStore {
    async fn find_client(&self, client_id: &str) -> AuthResult<Option<ClientCredential>> {
        Ok(self.clients.get(client_id).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;

    #[tokio::test]
    async fn test_revocation_set_and_exists() {
        let store = MemoryRevocationStore::new();
        assert!(!store.exists("k").await.unwrap());

        store.set("k", 60).await.unwrap();
        assert!(store.exists("k").await.unwrap());
        assert!(!store.exists("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_revocation_entry_expires() {
        let store = MemoryRevocationStore::new();
        store.set("k", 0).await.unwrap();

        assert!(!store.exists("k").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_rewrite_keeps_longest_ttl() {
        let store = MemoryRevocationStore::new();
        store.set("k", 60).await.unwrap();
        store.set("k", 0).await.unwrap();

        assert!(store.exists("k").await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryRevocationStore::new();
        store.set("live", 60).await.unwrap();
        store.set("dead", 0).await.unwrap();

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_writes_sweep_expired_entries() {
        let store = MemoryRevocationStore::with_purge_interval(10);
        for i in 0..100 {
            store.set(&format!("expired-{i}"), 0).await.unwrap();
        }
        store.set("live", 60).await.unwrap();

        assert!(store.len() < 10, "map kept {} entries", store.len());
        assert!(store.exists("live").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_entries() {
        let store = MemoryRevocationStore::with_purge_interval(2);
        store.set("a", 60).await.unwrap();
        store.set("b", 60).await.unwrap();
        store.set("c", 0).await.unwrap();
        store.set("d", 60).await.unwrap();

        assert_eq!(store.len(), 3);
        for key in ["a", "b", "d"] {
            assert!(store.exists(key).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryRevocationStore::new();
        let clone = store.clone();
        store.set("k", 60).await.unwrap();
        assert!(clone.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_credential_lookup() {
        let store = MemoryCredentialStore::from_credentials([ClientCredential {
            client_id: "acme".to_string(),
            name: Some("Acme".to_string()),
            secret_hash: "$argon2id$stub".to_string(),
            allowed_scopes: vec![Scope::LocationRetrievalRead],
            active: true,
        }]);

        let found = store.find_client("acme").await.unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("Acme"));
        assert!(store.find_client("unknown").await.unwrap().is_none());

        assert!(store.remove("acme").is_some());
        assert!(store.is_empty());
    }
}
