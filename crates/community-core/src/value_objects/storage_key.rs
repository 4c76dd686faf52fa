//! Storage key definitions.
//!
//! Defines the key naming conventions of the shared key-value store.

use std::fmt;

use super::UserId;

/// Key holding the JSON array of registered users
pub const REGISTERED_USERS_KEY: &str = "registeredUsers";
/// Key holding the JSON record of the logged-in user
pub const CURRENT_USER_KEY: &str = "currentUser";
/// Key holding the JSON array of exchanged messages
pub const MESSAGES_KEY: &str = "messages";
/// Key prefix for per-user presence markers
pub const LAST_SEEN_PREFIX: &str = "lastSeen_";

/// Keys of the shared key-value store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// All registered users
    RegisteredUsers,
    /// The logged-in user of this context
    CurrentUser,
    /// All stored messages
    Messages,
    /// Presence marker of one user
    LastSeen(UserId),
    /// Any other key
    Custom(String),
}

impl StorageKey {
    /// Create a presence marker key
    #[must_use]
    pub fn last_seen(user_id: &UserId) -> Self {
        Self::LastSeen(user_id.clone())
    }

    /// Create a custom key
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the raw key name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::RegisteredUsers => REGISTERED_USERS_KEY.to_string(),
            Self::CurrentUser => CURRENT_USER_KEY.to_string(),
            Self::Messages => MESSAGES_KEY.to_string(),
            Self::LastSeen(id) => format!("{LAST_SEEN_PREFIX}{id}"),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a raw key name back to a `StorageKey`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            REGISTERED_USERS_KEY => return Self::RegisteredUsers,
            CURRENT_USER_KEY => return Self::CurrentUser,
            MESSAGES_KEY => return Self::Messages,
            _ => {}
        }

        if let Some(email) = name.strip_prefix(LAST_SEEN_PREFIX) {
            if !email.is_empty() {
                return Self::LastSeen(UserId::new(email));
            }
        }

        Self::Custom(name.to_string())
    }

    /// Check if a change to this key affects the member list
    #[must_use]
    pub fn affects_user_list(&self) -> bool {
        matches!(self, Self::RegisteredUsers)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
