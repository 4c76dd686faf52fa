//! In-memory key-value store
//!
//! Holds every key in a `DashMap` shared by all handles opened from the same
//! store. Each handle is its own storage context: it stamps its `ContextId` on
//! the events it emits, so subscribers can tell their own writes apart from
//! writes made by other contexts.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use community_core::{ContextId, DomainError, KeyValueStore, StorageEvent, StorageKey, StoreResult};
use dashmap::DashMap;
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 256;

/// State shared by every context of one store
struct Shared {
    entries: DashMap<String, String>,
    events: broadcast::Sender<StorageEvent>,
    writes: AtomicU64,
    offline: AtomicBool,
}

/// Handle to an in-memory store, bound to one storage context
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    context_id: ContextId,
}

impl MemoryStore {
    /// Create an empty store and its first context
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            shared: Arc::new(Shared {
                entries: DashMap::new(),
                events,
                writes: AtomicU64::new(0),
                offline: AtomicBool::new(false),
            }),
            context_id: ContextId::generate(),
        }
    }

    /// Open another context on the same data, like a second tab
    #[must_use]
    pub fn open_context(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            context_id: ContextId::generate(),
        }
    }

    /// Load raw values without emitting events or counting writes
    pub fn seed<K, V, I>(&self, pairs: I)
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.shared.entries.insert(key.into(), value.into());
        }
    }

    /// Copy of every key and value, sorted by key
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .shared
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort();
        entries
    }

    /// Remove every key and notify subscribers
    pub fn clear(&self) {
        self.shared.entries.clear();
        self.shared.writes.fetch_add(1, Ordering::Relaxed);
        self.emit(StorageEvent::cleared(self.context_id));
        tracing::debug!(context = %self.context_id, "Memory store cleared");
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.entries.is_empty()
    }

    /// Number of writes and removals made by any context
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.shared.writes.load(Ordering::Relaxed)
    }

    /// Make every read and write fail as if the backend were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::Relaxed);
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.shared.offline.load(Ordering::Relaxed) {
            Err(DomainError::StorageUnavailable(
                "memory store is offline".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn emit(&self, event: StorageEvent) {
        // No subscribers is fine
        let _ = self.shared.events.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("context_id", &self.context_id)
            .field("keys", &self.shared.entries.len())
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn context_id(&self) -> ContextId {
        self.context_id
    }

    async fn get(&self, key: &StorageKey) -> StoreResult<Option<String>> {
        self.ensure_online()?;
        Ok(self
            .shared
            .entries
            .get(&key.name())
            .map(|value| value.clone()))
    }

    async fn set(&self, key: &StorageKey, value: &str) -> StoreResult<()> {
        self.ensure_online()?;
        self.shared.entries.insert(key.name(), value.to_string());
        self.shared.writes.fetch_add(1, Ordering::Relaxed);
        self.emit(StorageEvent::changed(key, self.context_id));
        tracing::trace!(context = %self.context_id, key = %key, "Key written");
        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> StoreResult<bool> {
        self.ensure_online()?;
        let existed = self.shared.entries.remove(&key.name()).is_some();
        if existed {
            self.shared.writes.fetch_add(1, Ordering::Relaxed);
            self.emit(StorageEvent::changed(key, self.context_id));
            tracing::trace!(context = %self.context_id, key = %key, "Key removed");
        }
        Ok(existed)
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.shared.events.subscribe()
    }

    async fn announce(&self, event: StorageEvent) -> StoreResult<()> {
        tracing::trace!(context = %self.context_id, event_type = event.name(), "Announcing event");
        self.emit(event);
        Ok(())
    }
}
