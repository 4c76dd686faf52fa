//! Domain entities - records kept in the shared key-value store

mod message;
mod presence_marker;
mod user;

pub use message::MessageRecord;
pub use presence_marker::PresenceMarker;
pub use user::UserRecord;

use serde::de::DeserializeOwned;

use crate::error::{DomainError, DomainResult};
use crate::value_objects::StorageKey;

/// Decode a stored JSON array into records.
///
/// The outer value must be a JSON array; entries that do not match `T` are
/// skipped so one bad record does not hide the rest of the collection.
pub fn decode_list<T: DeserializeOwned>(key: &StorageKey, raw: &str) -> DomainResult<Vec<T>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| DomainError::MalformedValue {
            key: key.name(),
            reason: e.to_string(),
        })?;

    Ok(values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}
