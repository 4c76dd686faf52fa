//! Storage backend selection

use std::sync::Arc;

use anyhow::Context;
use community_cache::{MemoryStore, RedisPool, RedisStore, RedisStoreConfig};
use community_common::{AppError, AppResult, StorageBackend, StorageConfig};
use community_core::SharedStore;
use tracing::info;

/// Connect the backend named by the configuration
pub async fn connect_store(config: &StorageConfig) -> AppResult<SharedStore> {
    match config.backend {
        StorageBackend::Memory => {
            let store = MemoryStore::new();
            if let Some(path) = &config.seed_file {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read seed file {path}"))
                    .map_err(AppError::Internal)?;
                let pairs = parse_seed(&raw)?;
                info!(path = %path, keys = pairs.len(), "Seeding memory store");
                store.seed(pairs);
            }
            Ok(Arc::new(store))
        }
        StorageBackend::Redis => {
            let redis = config
                .redis
                .as_ref()
                .ok_or_else(|| AppError::Config("REDIS_URL is required for the redis backend".to_string()))?;

            info!("Connecting to Redis...");
            let pool = RedisPool::from_config(redis).map_err(|e| AppError::Storage(e.to_string()))?;
            let store = RedisStore::connect(pool, RedisStoreConfig::from(config)).await?;
            info!(prefix = %store.prefix(), "Redis store ready");
            Ok(Arc::new(store))
        }
    }
}

/// Parse a seed document: a JSON object mapping keys to values.
///
/// String values are stored verbatim; any other value is stored as its JSON
/// text, so collections can be written inline.
pub fn parse_seed(raw: &str) -> AppResult<Vec<(String, String)>> {
    let document: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
        .map_err(|e| AppError::InvalidInput(format!("seed file must be a JSON object: {e}")))?;

    Ok(document
        .into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(text) => (key, text),
            other => (key, other.to_string()),
        })
        .collect())
}
