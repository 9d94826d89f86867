//! Integration tests for the Redis revocation store.
//!
//! Tests use testcontainers to spin up a real Redis instance and are ignored
//! by default. Run with `cargo test -p camara-auth-redis -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use camara_auth::config::{AuthConfig, RevocationConfig};
use camara_auth::secret::hash_client_secret;
use camara_auth::{
    AuthError, ClientCredential, IssueRequest, MemoryCredentialStore, RevocationStore, Scope,
    TokenService,
};
use camara_auth_redis::{RedisRevocationStore, connect};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;

// Shared Redis container for all tests
static SHARED_REDIS: OnceCell<(ContainerAsync<Redis>, String)> = OnceCell::const_new();

async fn get_redis_url() -> String {
    let (_, url) = SHARED_REDIS
        .get_or_init(|| async {
            let container = Redis::default()
                .start()
                .await
                .expect("start redis container");

            let host_port = container.get_host_port_ipv4(6379).await.expect("get port");
            let url = format!("redis://127.0.0.1:{host_port}/0");

            (container, url)
        })
        .await;

    url.clone()
}

async fn revocation_config() -> RevocationConfig {
    RevocationConfig {
        url: get_redis_url().await,
        pool_size: 4,
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

async fn store() -> RedisRevocationStore {
    connect(&revocation_config().await)
        .await
        .expect("connect to redis")
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_set_and_exists() {
    let store = store().await;

    assert!(!store.exists("revoked_token:set-and-exists").await.unwrap());
    store.set("revoked_token:set-and-exists", 60).await.unwrap();
    assert!(store.exists("revoked_token:set-and-exists").await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_entry_expires_with_ttl() {
    let store = store().await;

    store.set("revoked_token:short-lived", 1).await.unwrap();
    assert!(store.exists("revoked_token:short-lived").await.unwrap());

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert!(!store.exists("revoked_token:short-lived").await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_repeated_set_is_harmless() {
    let store = store().await;

    store.set("revoked_token:twice", 60).await.unwrap();
    store.set("revoked_token:twice", 30).await.unwrap();
    assert!(store.exists("revoked_token:twice").await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_revocation_visible_across_instances() {
    let mut config = AuthConfig::default();
    config.revocation = revocation_config().await;

    let credentials = Arc::new(MemoryCredentialStore::from_credentials([ClientCredential {
        client_id: "acme".to_string(),
        name: None,
        secret_hash: hash_client_secret("acme-secret").unwrap(),
        allowed_scopes: vec![Scope::LocationRetrievalRead],
        active: true,
    }]));

    let first = TokenService::from_config(&config, credentials.clone(), Arc::new(store().await));
    let second = TokenService::from_config(&config, credentials, Arc::new(store().await));

    let issued = first
        .issue(IssueRequest::TwoLegged {
            client_id: "acme".to_string(),
            client_secret: "acme-secret".to_string(),
            scopes: vec![Scope::LocationRetrievalRead],
        })
        .await
        .unwrap();

    assert!(second.validate(&issued.token).await.is_ok());
    assert!(first.revoke(&issued.token, "acme", "acme-secret").await.unwrap());
    assert!(matches!(
        second.validate(&issued.token).await,
        Err(AuthError::Revoked)
    ));
}
