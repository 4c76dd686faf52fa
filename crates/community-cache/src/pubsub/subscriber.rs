//! Redis Pub/Sub subscriber.
//!
//! Listens on a fixed set of storage channels and re-broadcasts decoded
//! `StorageEvent`s to local receivers. The connection is re-established after
//! any failure until the subscriber is shut down or dropped.

use std::time::Duration;

use community_core::StorageEvent;
use futures_util::StreamExt;
use redis::Client;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::pubsub::StorageChannel;

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("No channels to subscribe to")]
    NoChannels,
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Channel buffer size for broadcast
    pub broadcast_buffer: usize,
    /// Reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 256,
            reconnect_delay_ms: 1000,
        }
    }
}

/// How a listener run ended
enum RunEnd {
    Shutdown,
    StreamEnded,
}

/// Background Pub/Sub listener
pub struct Subscriber {
    channels: Vec<String>,
    events: broadcast::Sender<StorageEvent>,
    subscribed: watch::Receiver<bool>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Subscriber {
    fn spawn(
        config: SubscriberConfig,
        channels: Vec<String>,
        events: broadcast::Sender<StorageEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (subscribed_tx, subscribed) = watch::channel(false);
        let task = tokio::spawn(listen(
            config,
            channels.clone(),
            events.clone(),
            subscribed_tx,
            shutdown_rx,
        ));

        Self {
            channels,
            events,
            subscribed,
            shutdown_tx,
            task,
        }
    }

    /// Get a receiver for decoded events
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    /// Names of the channels listened on
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Wait until the channels are subscribed on a live connection.
    ///
    /// Returns `false` if that does not happen within `timeout`. Events
    /// published before the subscription is in place are not delivered.
    pub async fn wait_subscribed(&self, timeout: Duration) -> bool {
        let mut subscribed = self.subscribed.clone();
        let ready = matches!(
            tokio::time::timeout(timeout, subscribed.wait_for(|ready| *ready)).await,
            Ok(Ok(_))
        );
        ready
    }

    /// Stop listening and wait for the connection to close
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Subscriber task ended abnormally");
        }
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("channels", &self.channels)
            .field("receivers", &self.events.receiver_count())
            .finish()
    }
}

/// Keep a listener connected until shutdown
async fn listen(
    config: SubscriberConfig,
    channels: Vec<String>,
    events: broadcast::Sender<StorageEvent>,
    subscribed: watch::Sender<bool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let delay = Duration::from_millis(config.reconnect_delay_ms);

    loop {
        let outcome = run_once(&config.redis_url, &channels, &events, &subscribed, &mut shutdown).await;
        subscribed.send_replace(false);

        match outcome {
            Ok(RunEnd::Shutdown) => {
                tracing::info!("Subscriber shutting down");
                return;
            }
            Ok(RunEnd::StreamEnded) => tracing::warn!("Subscriber stream ended, reconnecting..."),
            Err(e) => tracing::error!(error = %e, "Subscriber error, reconnecting..."),
        }

        tokio::select! {
            _ = shutdown.changed() => return,
            () = tokio::time::sleep(delay) => {}
        }
    }
}

/// One connection's lifetime
async fn run_once(
    redis_url: &str,
    channels: &[String],
    events: &broadcast::Sender<StorageEvent>,
    subscribed: &watch::Sender<bool>,
    shutdown: &mut watch::Receiver<bool>,
) -> SubscriberResult<RunEnd> {
    let client = Client::open(redis_url)?;
    let mut pubsub = client.get_async_pubsub().await?;
    for channel in channels {
        pubsub.subscribe(channel).await?;
    }

    subscribed.send_replace(true);
    tracing::info!(channels = ?channels, "Subscriber connected to Redis");

    let mut stream = pubsub.on_message();

    loop {
        tokio::select! {
            _ = shutdown.changed() => return Ok(RunEnd::Shutdown),
            msg = stream.next() => {
                let Some(msg) = msg else {
                    return Ok(RunEnd::StreamEnded);
                };
                let payload: String = msg.get_payload().unwrap_or_default();

                match decode_event(&payload) {
                    Some(event) => {
                        tracing::trace!(
                            channel = msg.get_channel_name(),
                            event_type = event.name(),
                            "Received storage event"
                        );
                        // No local receivers is not an error
                        let _ = events.send(event);
                    }
                    None => tracing::debug!(
                        channel = msg.get_channel_name(),
                        "Ignoring undecodable Pub/Sub payload"
                    ),
                }
            }
        }
    }
}

/// Decode a Pub/Sub payload into a storage event
fn decode_event(payload: &str) -> Option<StorageEvent> {
    serde_json::from_str(payload).ok()
}

/// Builder for subscriber
pub struct SubscriberBuilder {
    config: SubscriberConfig,
    channels: Vec<StorageChannel>,
    sender: Option<broadcast::Sender<StorageEvent>>,
}

impl SubscriberBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SubscriberConfig::default(),
            channels: Vec::new(),
            sender: None,
        }
    }

    /// Set Redis URL
    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = url.into();
        self
    }

    /// Set broadcast buffer size
    #[must_use]
    pub fn broadcast_buffer(mut self, size: usize) -> Self {
        self.config.broadcast_buffer = size;
        self
    }

    /// Set reconnection delay
    #[must_use]
    pub fn reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.config.reconnect_delay_ms = delay;
        self
    }

    /// Deliver decoded events into an existing broadcast sender
    #[must_use]
    pub fn sender(mut self, sender: broadcast::Sender<StorageEvent>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Add a channel to listen on
    #[must_use]
    pub fn subscribe(mut self, channel: StorageChannel) -> Self {
        self.channels.push(channel);
        self
    }

    /// Start the listener
    pub fn build(self) -> SubscriberResult<Subscriber> {
        if self.channels.is_empty() {
            return Err(SubscriberError::NoChannels);
        }

        let events = self
            .sender
            .unwrap_or_else(|| broadcast::channel(self.config.broadcast_buffer).0);
        let channels = self.channels.iter().map(StorageChannel::name).collect();

        Ok(Subscriber::spawn(self.config, channels, events))
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}
