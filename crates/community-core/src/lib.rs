//! # community-core
//!
//! Domain layer containing the stored records, storage keys, the storage port,
//! and the notifications exchanged between storage contexts.
//! This crate has zero dependencies on infrastructure (Redis, runtime setup, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{decode_list, MessageRecord, PresenceMarker, UserRecord};
pub use error::{DomainError, DomainResult};
pub use events::StorageEvent;
pub use traits::{
    Clock, KeyValueStore, ManualClock, MonotonicClock, SharedStore, StoreResult, SystemClock,
};
pub use value_objects::{
    ContextId, StorageKey, UserId, CURRENT_USER_KEY, LAST_SEEN_PREFIX, MESSAGES_KEY,
    REGISTERED_USERS_KEY,
};
