//! Redis Pub/Sub publisher.
//!
//! Publishes storage events so contexts in other processes can invalidate.

use community_core::StorageEvent;

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::StorageChannel;

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event to a channel
    pub async fn publish(&self, channel: &StorageChannel, event: &StorageEvent) -> RedisResult<u32> {
        let channel_name = channel.name();
        let payload = serde_json::to_string(event)?;

        let receivers = self.pool.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event_type = event.name(),
            origin = %event.origin(),
            receivers = receivers,
            "Published storage event"
        );

        Ok(receivers)
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").field("pool", &self.pool).finish()
    }
}
