//! # community-cache
//!
//! Implementations of the `KeyValueStore` storage port.
//!
//! ## Features
//!
//! - **Memory store**: process-local store shared by any number of contexts,
//!   with change notifications fanned out over a broadcast channel
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Redis store**: persistent store with key namespacing
//! - **Pub/Sub**: change notifications distributed across processes
//!
//! ## Example
//!
//! ```ignore
//! use community_cache::{MemoryStore, RedisPool, RedisPoolConfig, RedisStore};
//!
//! // Two contexts over one in-memory store
//! let tab_a = MemoryStore::new();
//! let tab_b = tab_a.open_context();
//!
//! // Or a Redis-backed store
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let store = RedisStore::connect(pool, RedisStoreConfig::default()).await?;
//! ```

pub mod memory;
pub mod pool;
pub mod pubsub;
pub mod redis_store;

// Re-export memory store types
pub use memory::MemoryStore;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export pubsub types
pub use pubsub::{
    Publisher, StorageChannel, Subscriber, SubscriberBuilder, SubscriberConfig, SubscriberError,
    SubscriberResult, STORAGE_CHANNEL_SUFFIX,
};

// Re-export redis store types
pub use redis_store::{RedisStore, RedisStoreConfig};
