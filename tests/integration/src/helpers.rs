//! Test helpers for integration tests
//!
//! `TestCommunity` stands in for one browser profile: a single store shared by
//! any number of tabs, each with its own storage context.

use std::sync::Arc;

use anyhow::Result;
use community_cache::MemoryStore;
use community_common::PresenceConfig;
use community_core::{
    KeyValueStore, MessageRecord, MonotonicClock, StorageKey, UserId, UserRecord,
};
use community_service::{PresenceSession, ServiceContext};

use crate::fixtures::{messages_json, users_json, START_MS};

/// Shared store plus the tabs opened on it
pub struct TestCommunity {
    store: MemoryStore,
    clock: Arc<MonotonicClock>,
    config: PresenceConfig,
}

impl TestCommunity {
    /// Create an empty community with default presence settings
    pub fn new() -> Self {
        Self::with_config(PresenceConfig::default())
    }

    /// Create an empty community with custom presence settings
    pub fn with_config(config: PresenceConfig) -> Self {
        Self {
            store: MemoryStore::new(),
            clock: Arc::new(MonotonicClock::new(START_MS)),
            config,
        }
    }

    /// The store as seen from the first tab
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Open a new tab on the shared store
    pub fn open_tab(&self) -> ServiceContext {
        ServiceContext::builder(Arc::new(self.store.open_context()))
            .clock(self.clock.clone())
            .config(self.config.clone())
            .build()
    }

    /// Open a tab and mount the community page in it
    pub async fn mount(&self) -> (ServiceContext, PresenceSession) {
        let tab = self.open_tab();
        let session = PresenceSession::mount(tab.clone()).await;
        (tab, session)
    }

    /// Preload registered users without notifying anyone
    pub fn seed_users(&self, users: &[UserRecord]) {
        self.store.seed([("registeredUsers", users_json(users))]);
    }

    /// Preload the logged-in user
    pub fn seed_login(&self, user: &UserRecord) {
        let raw = serde_json::to_string(user).unwrap_or_else(|_| "null".to_string());
        self.store.seed([("currentUser", raw)]);
    }

    /// Preload a presence marker
    pub fn seed_marker(&self, email: &str, last_seen_ms: i64) {
        self.store
            .seed([(format!("lastSeen_{email}"), last_seen_ms.to_string())]);
    }

    /// Preload the message history
    pub fn seed_messages(&self, messages: &[MessageRecord]) {
        self.store.seed([("messages", messages_json(messages))]);
    }

    /// Write the user list from another tab, as the registration flow does
    pub async fn register_from_other_tab(&self, users: &[UserRecord]) -> Result<()> {
        let tab = self.store.open_context();
        tab.set(&StorageKey::RegisteredUsers, &users_json(users))
            .await?;
        Ok(())
    }

    /// Current stored marker of a member
    pub async fn marker(&self, email: &str) -> Option<i64> {
        self.store
            .get(&StorageKey::last_seen(&UserId::from(email)))
            .await
            .ok()
            .flatten()
            .and_then(|raw| raw.parse().ok())
    }
}

impl Default for TestCommunity {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to check if a Redis server is available for tests
pub fn check_redis_env() -> Option<String> {
    dotenvy::dotenv().ok();

    match std::env::var("REDIS_URL") {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: REDIS_URL not set");
            None
        }
    }
}
