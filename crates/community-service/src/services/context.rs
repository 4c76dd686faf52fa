//! Service context - dependency container for services
//!
//! Holds the storage port, the clock and the presence settings, plus the
//! degrading read helpers every service shares.

use std::sync::Arc;

use community_common::PresenceConfig;
use community_core::{decode_list, Clock, SharedStore, StorageKey, SystemClock};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    config: PresenceConfig,
}

impl ServiceContext {
    /// Create a context over a store, using the system clock and default settings
    pub fn new(store: SharedStore) -> Self {
        ServiceContextBuilder::new(store).build()
    }

    /// Start building a context
    pub fn builder(store: SharedStore) -> ServiceContextBuilder {
        ServiceContextBuilder::new(store)
    }

    /// Get the storage port
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Get the clock
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Get the presence settings
    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    /// Current time in epoch milliseconds
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Read a raw value, logging and swallowing storage failures
    pub async fn read_raw(&self, key: &StorageKey) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Storage read failed");
                None
            }
        }
    }

    /// Read a JSON array, degrading to an empty list when absent or malformed
    pub async fn read_list<T: DeserializeOwned>(&self, key: &StorageKey) -> Vec<T> {
        let Some(raw) = self.read_raw(key).await else {
            return Vec::new();
        };

        decode_list(key, &raw).unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "Ignoring malformed collection");
            Vec::new()
        })
    }

    /// Read one JSON record, degrading to `None` when absent, `null` or malformed
    pub async fn read_record<T: DeserializeOwned>(&self, key: &StorageKey) -> Option<T> {
        let raw = self.read_raw(key).await?;

        serde_json::from_str::<Option<T>>(&raw).unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "Ignoring malformed record");
            None
        })
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("context_id", &self.store.context_id())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for `ServiceContext`
pub struct ServiceContextBuilder {
    store: SharedStore,
    clock: Option<Arc<dyn Clock>>,
    config: Option<PresenceConfig>,
}

impl ServiceContextBuilder {
    /// Create a new builder
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            clock: None,
            config: None,
        }
    }

    /// Set the clock
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the presence settings
    #[must_use]
    pub fn config(mut self, config: PresenceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    pub fn build(self) -> ServiceContext {
        ServiceContext {
            store: self.store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            config: self.config.unwrap_or_default(),
        }
    }
}
