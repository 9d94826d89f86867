use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use camara_auth::{ClientCredential, MemoryCredentialStore};
use serde::{Deserialize, Serialize};

/// Client registry file.
///
/// ```toml
/// [[clients]]
/// client_id = "acme"
/// secret_hash = "$argon2id$v=19$..."
/// allowed_scopes = ["location-retrieval:read"]
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClientRegistry {
    #[serde(default)]
    pub clients: Vec<ClientCredential>,
}

pub fn parse_registry(content: &str) -> Result<ClientRegistry> {
    let registry: ClientRegistry = toml::from_str(content)?;

    let mut seen = std::collections::HashSet::new();
    for client in &registry.clients {
        if !seen.insert(client.client_id.as_str()) {
            anyhow::bail!("Duplicate client_id in registry: {}", client.client_id);
        }
    }

    Ok(registry)
}

pub fn load_registry(path: &Path) -> Result<MemoryCredentialStore> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Client registry not found, no clients registered");
        return Ok(MemoryCredentialStore::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read client registry {}", path.display()))?;
    let registry = parse_registry(&content)
        .with_context(|| format!("Invalid client registry {}", path.display()))?;

    tracing::debug!(clients = registry.clients.len(), "Client registry loaded");
    Ok(MemoryCredentialStore::from_credentials(registry.clients))
}
