//! Redis store integration tests
//!
//! These tests require:
//! - Running Redis instance
//! - Environment variable: REDIS_URL
//!
//! Run with: cargo test -p integration-tests --test redis_tests

use std::time::Duration;

use community_cache::{RedisPool, RedisPoolConfig, RedisStore, RedisStoreConfig};
use community_core::{KeyValueStore, StorageKey, UserId};
use integration_tests::{check_redis_env, unique_suffix};

async fn connect(url: &str, prefix: &str) -> RedisStore {
    let pool = RedisPool::new(RedisPoolConfig {
        url: url.to_string(),
        max_connections: 4,
    })
    .expect("Failed to create pool");

    RedisStore::connect(
        pool,
        RedisStoreConfig {
            key_prefix: prefix.to_string(),
            ..RedisStoreConfig::default()
        },
    )
    .await
    .expect("Failed to connect store")
}

#[tokio::test]
async fn test_redis_round_trip() {
    let Some(url) = check_redis_env() else {
        return;
    };
    let prefix = format!("community-test-{}:", unique_suffix());
    let store = connect(&url, &prefix).await;
    let key = StorageKey::last_seen(&UserId::from("a@x.com"));

    store.set(&key, "1717000000000").await.unwrap();
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("1717000000000"));

    assert!(store.remove(&key).await.unwrap());
    assert!(store.get(&key).await.unwrap().is_none());

    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_redis_notifications_cross_processes() {
    let Some(url) = check_redis_env() else {
        return;
    };
    let prefix = format!("community-test-{}:", unique_suffix());
    let writer = connect(&url, &prefix).await;
    let reader = connect(&url, &prefix).await;
    let mut events = reader.subscribe();

    // connect returns with the subscription in place, so no settle delay
    writer.set(&StorageKey::RegisteredUsers, "[]").await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("No notification received")
        .unwrap();
    assert_eq!(event.origin(), writer.context_id());
    assert!(event.invalidates_user_list(reader.context_id()));

    writer.clear().await.unwrap();
}
