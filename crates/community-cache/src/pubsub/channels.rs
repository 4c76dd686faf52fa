//! Pub/Sub channel definitions.
//!
//! Defines the channel naming conventions for Redis Pub/Sub.

/// Suffix appended to the key prefix to form the storage channel name
pub const STORAGE_CHANNEL_SUFFIX: &str = "storage";

/// Channel carrying `StorageEvent`s for one key namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageChannel {
    prefix: String,
}

impl StorageChannel {
    /// Create the channel for a key prefix (e.g. `community:`)
    #[must_use]
    pub fn for_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}{STORAGE_CHANNEL_SUFFIX}", self.prefix)
    }

    /// Parse a channel name back to a `StorageChannel`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        name.strip_suffix(STORAGE_CHANNEL_SUFFIX)
            .map(Self::for_prefix)
    }
}

impl std::fmt::Display for StorageChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
