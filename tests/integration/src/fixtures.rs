//! Test fixtures and data generators
//!
//! Provides reusable test data for integration tests.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use community_core::{MessageRecord, UserId, UserRecord};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Wall-clock instant every simulated page starts at
pub const START_MS: i64 = 1_717_000_000_000;

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A member with a unique email
pub fn unique_user() -> UserRecord {
    let suffix = unique_suffix();
    UserRecord::new(format!("Member {suffix}"), format!("member{suffix}@example.com"))
        .with_description("Integration test member")
}

/// A member with a fixed email
pub fn user(email: &str) -> UserRecord {
    let name = email.split('@').next().unwrap_or(email);
    UserRecord::new(name, email)
}

/// A message between two members at `at_ms`
pub fn message(sender: &str, receiver: &str, at_ms: i64) -> MessageRecord {
    MessageRecord::new(UserId::from(sender), UserId::from(receiver), at(at_ms))
}

/// Epoch milliseconds as a UTC datetime
pub fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

/// Serialized `registeredUsers` value
pub fn users_json(users: &[UserRecord]) -> String {
    serde_json::to_string(users).unwrap_or_else(|_| "[]".to_string())
}

/// Serialized `messages` value
pub fn messages_json(messages: &[MessageRecord]) -> String {
    serde_json::to_string(messages).unwrap_or_else(|_| "[]".to_string())
}
