//! Presence marker - the last time a member was seen active

use chrono::{DateTime, TimeZone, Utc};

use crate::value_objects::{StorageKey, UserId};

/// Last-activity timestamp of one member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceMarker {
    pub user_id: UserId,
    /// Milliseconds since the Unix epoch
    pub last_seen_ms: i64,
}

impl PresenceMarker {
    /// Create a new marker
    pub fn new(user_id: UserId, last_seen_ms: i64) -> Self {
        Self {
            user_id,
            last_seen_ms,
        }
    }

    /// Storage key of this marker
    pub fn key(&self) -> StorageKey {
        StorageKey::last_seen(&self.user_id)
    }

    /// Stored representation: the decimal epoch-ms integer
    pub fn encode(&self) -> String {
        self.last_seen_ms.to_string()
    }

    /// Parse a stored marker value.
    ///
    /// Returns `None` for anything that is not a finite number.
    pub fn parse(user_id: UserId, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let last_seen_ms = match raw.parse::<i64>() {
            Ok(ms) => ms,
            Err(_) => {
                let ms = raw.parse::<f64>().ok().filter(|ms| ms.is_finite())?;
                ms.trunc() as i64
            }
        };
        Some(Self::new(user_id, last_seen_ms))
    }

    /// Check if the marker is newer than `now_ms - threshold_ms`
    #[inline]
    pub fn is_fresh(&self, now_ms: i64, threshold_ms: i64) -> bool {
        self.last_seen_ms > now_ms.saturating_sub(threshold_ms)
    }

    /// Marker time as a UTC datetime
    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.last_seen_ms).single()
    }
}
