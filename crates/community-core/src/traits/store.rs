//! Storage port - the shared key-value store
//!
//! The domain layer defines what it needs from the store, and the
//! infrastructure layer provides the implementation (in-memory, Redis).
//! Every call is a fresh read or write; implementations must not cache
//! values across calls, since other contexts may write at any time.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::DomainError;
use crate::events::StorageEvent;
use crate::value_objects::{ContextId, StorageKey};

/// Result type for storage operations
pub type StoreResult<T> = Result<T, DomainError>;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Identity of this context, stamped on every event it emits
    fn context_id(&self) -> ContextId;

    /// Read the raw value of a key
    async fn get(&self, key: &StorageKey) -> StoreResult<Option<String>>;

    /// Write the raw value of a key and notify subscribers
    async fn set(&self, key: &StorageKey, value: &str) -> StoreResult<()>;

    /// Remove a key and notify subscribers. Returns whether the key existed.
    async fn remove(&self, key: &StorageKey) -> StoreResult<bool>;

    /// Receive every event emitted by any context sharing this store
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;

    /// Publish an application-level event to every context
    async fn announce(&self, event: StorageEvent) -> StoreResult<()>;
}

/// Store handle shared between tasks
pub type SharedStore = Arc<dyn KeyValueStore>;
