//! Storage events
//!
//! Emitted when a context writes to the shared store, or when the application
//! announces that a new member registered. Subscribers in other contexts use
//! them to invalidate whatever they derived from the store.

use serde::{Deserialize, Serialize};

use crate::value_objects::{ContextId, StorageKey, UserId};

/// Notification delivered to every subscriber of a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageEvent {
    /// A key was written or removed. `key` is `None` when the whole store was cleared.
    StorageChanged {
        key: Option<String>,
        origin: ContextId,
    },
    /// The registration flow added a member
    UserRegistered {
        origin: ContextId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<UserId>,
    },
}

impl StorageEvent {
    /// Create a change notification for a key
    #[must_use]
    pub fn changed(key: &StorageKey, origin: ContextId) -> Self {
        Self::StorageChanged {
            key: Some(key.name()),
            origin,
        }
    }

    /// Create a notification for a cleared store
    #[must_use]
    pub fn cleared(origin: ContextId) -> Self {
        Self::StorageChanged { key: None, origin }
    }

    /// Create a registration announcement
    #[must_use]
    pub fn user_registered(origin: ContextId, email: Option<UserId>) -> Self {
        Self::UserRegistered { origin, email }
    }

    /// Event type name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StorageChanged { .. } => "STORAGE_CHANGED",
            Self::UserRegistered { .. } => "USER_REGISTERED",
        }
    }

    /// Context that produced the event
    #[must_use]
    pub fn origin(&self) -> ContextId {
        match self {
            Self::StorageChanged { origin, .. } | Self::UserRegistered { origin, .. } => *origin,
        }
    }

    /// Parsed key of a change notification
    #[must_use]
    pub fn key(&self) -> Option<StorageKey> {
        match self {
            Self::StorageChanged { key: Some(key), .. } => Some(StorageKey::parse(key)),
            _ => None,
        }
    }

    /// Check if a context holding a member list must re-read it.
    ///
    /// Change notifications only count when they come from another context and
    /// touch the member list (or clear the store). Registration announcements
    /// count from any context, including the observer itself.
    #[must_use]
    pub fn invalidates_user_list(&self, observer: ContextId) -> bool {
        match self {
            Self::StorageChanged { key, origin } => {
                *origin != observer
                    && key
                        .as_deref()
                        .is_none_or(|key| StorageKey::parse(key).affects_user_list())
            }
            Self::UserRegistered { .. } => true,
        }
    }
}
