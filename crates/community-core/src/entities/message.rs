//! Message record - one message as written by the messaging modal
//!
//! Only the routing fields and the timestamp are modelled; any other field in
//! the stored object is ignored.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::value_objects::UserId;

/// Stored message, reduced to what the last-activity lookup needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl MessageRecord {
    /// Create a new MessageRecord
    pub fn new(sender_id: UserId, receiver_id: UserId, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender_id,
            receiver_id,
            timestamp,
        }
    }

    /// Check if the user sent or received this message
    #[inline]
    pub fn involves(&self, user_id: &UserId) -> bool {
        &self.sender_id == user_id || &self.receiver_id == user_id
    }

    /// The other party of the conversation, if `user_id` took part in it
    pub fn counterpart(&self, user_id: &UserId) -> Option<&UserId> {
        if &self.sender_id == user_id {
            Some(&self.receiver_id)
        } else if &self.receiver_id == user_id {
            Some(&self.sender_id)
        } else {
            None
        }
    }
}

/// Timestamps are written either as ISO-8601 strings or as epoch milliseconds
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Fractional(f64),
    Text(String),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let millis = match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => ms,
        RawTimestamp::Fractional(ms) if ms.is_finite() => ms.trunc() as i64,
        RawTimestamp::Fractional(ms) => {
            return Err(D::Error::custom(format!("invalid timestamp: {ms}")));
        }
        RawTimestamp::Text(text) => match text.trim().parse::<i64>() {
            Ok(ms) => ms,
            Err(_) => {
                return DateTime::parse_from_rfc3339(text.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| D::Error::custom(format!("invalid timestamp {text:?}: {e}")));
            }
        },
    };

    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}")))
}
