//! Redis connection pool using deadpool-redis.
//!
//! The store keeps values as opaque strings, so the pool only offers the raw
//! string commands the store needs plus SCAN and PUBLISH.

use community_core::DomainError;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;

/// Keys fetched per SCAN round trip
const SCAN_BATCH: usize = 100;

/// Redis pool configuration
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    /// Redis connection URL (e.g., `redis://localhost:6379`)
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: usize,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 16,
        }
    }
}

impl From<&community_common::RedisConfig> for RedisPoolConfig {
    fn from(config: &community_common::RedisConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections as usize,
        }
    }
}

/// Error type for Redis pool operations
#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(String),

    #[error("Failed to get connection from pool: {0}")]
    GetConnection(#[from] deadpool_redis::PoolError),

    #[error("Redis command error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RedisPoolError> for DomainError {
    fn from(err: RedisPoolError) -> Self {
        match &err {
            RedisPoolError::CreatePool(_) | RedisPoolError::GetConnection(_) => {
                DomainError::StorageUnavailable(err.to_string())
            }
            RedisPoolError::Redis(_) => DomainError::StorageError(err.to_string()),
            RedisPoolError::Serialization(e) => DomainError::SerializationError(e.to_string()),
        }
    }
}

/// Result type for Redis pool operations
pub type RedisResult<T> = Result<T, RedisPoolError>;

/// Managed Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
    url: String,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("url", &redact_url(&self.url))
            .field("status", &self.pool.status())
            .finish()
    }
}

impl RedisPool {
    /// Build the pool; no connection is opened until first use
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let pool = Config::from_url(config.url.as_str())
            .builder()
            .map_err(create_error)?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(create_error)?;

        tracing::info!(
            url = %redact_url(&config.url),
            max_connections = config.max_connections,
            "Redis pool created"
        );

        Ok(Self {
            pool,
            url: config.url,
        })
    }

    pub fn from_config(config: &community_common::RedisConfig) -> RedisResult<Self> {
        Self::new(RedisPoolConfig::from(config))
    }

    /// Connection URL, needed to open dedicated Pub/Sub connections
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn connection(&self) -> RedisResult<Connection> {
        Ok(self.pool.get().await?)
    }

    /// PING through a pooled connection
    pub async fn health_check(&self) -> RedisResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    pub async fn get_raw(&self, key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.connection().await?;
        Ok(conn.get(key).await?)
    }

    pub async fn set_raw(&self, key: &str, value: &str) -> RedisResult<()> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    /// Delete keys, returning how many existed
    pub async fn delete_keys(&self, keys: &[String]) -> RedisResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        Ok(conn.del(keys).await?)
    }

    /// Publish a payload on a Pub/Sub channel, returning the receiver count
    pub async fn publish(&self, channel: &str, payload: &str) -> RedisResult<u32> {
        let mut conn = self.connection().await?;
        Ok(conn.publish(channel, payload).await?)
    }

    /// Every key matching `pattern`, collected over a full SCAN cycle
    pub async fn scan_keys(&self, pattern: &str) -> RedisResult<Vec<String>> {
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut found = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            found.extend(batch);

            if next == 0 {
                return Ok(found);
            }
            cursor = next;
        }
    }
}

fn create_error(err: impl std::fmt::Display) -> RedisPoolError {
    RedisPoolError::CreatePool(err.to_string())
}

/// Strip credentials from a Redis URL for logging
fn redact_url(url: &str) -> &str {
    url.rsplit('@').next().unwrap_or(url)
}
