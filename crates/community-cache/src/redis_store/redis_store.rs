//! Redis-backed key-value store
//!
//! Keys are namespaced under a prefix so several deployments can share one
//! Redis instance. Every write is followed by a `StorageEvent` published on the
//! prefix's storage channel; a dedicated subscriber feeds those events back to
//! local receivers, including the ones of the writing process.

use std::time::Duration;

use async_trait::async_trait;
use community_core::{
    ContextId, DomainError, KeyValueStore, StorageEvent, StorageKey, StoreResult,
};
use tokio::sync::broadcast;

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::{Publisher, StorageChannel, Subscriber, SubscriberBuilder};

/// Redis store configuration
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Prefix prepended to every key and to the notification channel
    pub key_prefix: String,
    /// Buffer size of the local event broadcast
    pub broadcast_buffer: usize,
    /// Delay before the subscriber reconnects
    pub reconnect_delay_ms: u64,
    /// How long `connect` waits for the notification channel subscription
    pub subscribe_timeout_ms: u64,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "community:".to_string(),
            broadcast_buffer: 256,
            reconnect_delay_ms: 1000,
            subscribe_timeout_ms: 5000,
        }
    }
}

impl From<&community_common::StorageConfig> for RedisStoreConfig {
    fn from(config: &community_common::StorageConfig) -> Self {
        Self {
            key_prefix: config.key_prefix.clone(),
            ..Self::default()
        }
    }
}

/// Key-value store persisted in Redis
pub struct RedisStore {
    pool: RedisPool,
    prefix: String,
    channel: StorageChannel,
    context_id: ContextId,
    publisher: Publisher,
    events: broadcast::Sender<StorageEvent>,
    // Held so the listener keeps running for the lifetime of the store
    _subscriber: Subscriber,
}

impl RedisStore {
    /// Check the connection and start listening for change notifications.
    ///
    /// Returns once the subscriber is listening, or after
    /// `subscribe_timeout_ms` with a warning; notifications published before
    /// the subscription lands are missed by this store.
    pub async fn connect(pool: RedisPool, config: RedisStoreConfig) -> StoreResult<Self> {
        pool.health_check().await?;

        let channel = StorageChannel::for_prefix(config.key_prefix.clone());
        let (events, _) = broadcast::channel(config.broadcast_buffer);

        let subscriber = SubscriberBuilder::new()
            .redis_url(pool.url())
            .broadcast_buffer(config.broadcast_buffer)
            .reconnect_delay_ms(config.reconnect_delay_ms)
            .sender(events.clone())
            .subscribe(channel.clone())
            .build()
            .map_err(|e| DomainError::StorageUnavailable(e.to_string()))?;

        if !subscriber
            .wait_subscribed(Duration::from_millis(config.subscribe_timeout_ms))
            .await
        {
            tracing::warn!(
                channel = %channel,
                timeout_ms = config.subscribe_timeout_ms,
                "Notification subscription not ready, continuing"
            );
        }

        let context_id = ContextId::generate();
        tracing::info!(
            context = %context_id,
            channel = %channel,
            "Redis store connected"
        );

        Ok(Self {
            publisher: Publisher::new(pool.clone()),
            pool,
            prefix: config.key_prefix,
            channel,
            context_id,
            events,
            _subscriber: subscriber,
        })
    }

    /// Key prefix of this store
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Remove every key under the prefix and notify subscribers
    pub async fn clear(&self) -> StoreResult<usize> {
        let keys = self.pool.scan_keys(&format!("{}*", self.prefix)).await?;
        let deleted = self.pool.delete_keys(&keys).await?;
        self.notify_written(StorageEvent::cleared(self.context_id)).await;

        tracing::debug!(context = %self.context_id, deleted = deleted, "Redis store cleared");
        Ok(keys.len())
    }

    fn full_key(&self, key: &StorageKey) -> String {
        prefixed(&self.prefix, key)
    }

    async fn notify(&self, event: StorageEvent) -> StoreResult<()> {
        self.publisher.publish(&self.channel, &event).await?;
        Ok(())
    }

    /// Publish after a write that already landed; a failure is only logged
    async fn notify_written(&self, event: StorageEvent) {
        let result = self.publisher.publish(&self.channel, &event).await;
        settle_notification(result, &event);
    }
}

/// Whether a post-write notification went out, logging when it did not
fn settle_notification(result: RedisResult<u32>, event: &StorageEvent) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                error = %e,
                event_type = event.name(),
                "Value written but change notification failed"
            );
            false
        }
    }
}

fn prefixed(prefix: &str, key: &StorageKey) -> String {
    format!("{prefix}{}", key.name())
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("prefix", &self.prefix)
            .field("context_id", &self.context_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn context_id(&self) -> ContextId {
        self.context_id
    }

    async fn get(&self, key: &StorageKey) -> StoreResult<Option<String>> {
        Ok(self.pool.get_raw(&self.full_key(key)).await?)
    }

    async fn set(&self, key: &StorageKey, value: &str) -> StoreResult<()> {
        self.pool.set_raw(&self.full_key(key), value).await?;
        self.notify_written(StorageEvent::changed(key, self.context_id)).await;
        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> StoreResult<bool> {
        let existed = self.pool.delete_keys(&[self.full_key(key)]).await? > 0;
        if existed {
            self.notify_written(StorageEvent::changed(key, self.context_id)).await;
        }
        Ok(existed)
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    async fn announce(&self, event: StorageEvent) -> StoreResult<()> {
        self.notify(event).await
    }
}
