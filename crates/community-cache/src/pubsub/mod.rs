//! Pub/Sub module for cross-process change notifications.
//!
//! Every Redis-backed context publishes its writes on one storage channel
//! and re-broadcasts what it hears to its local subscribers.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{StorageChannel, STORAGE_CHANNEL_SUFFIX};
pub use publisher::Publisher;
pub use subscriber::{
    Subscriber, SubscriberBuilder, SubscriberConfig, SubscriberError, SubscriberResult,
};
