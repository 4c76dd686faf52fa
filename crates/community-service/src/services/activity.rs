//! Last-activity lookup
//!
//! Finds the most recent message a member sent or received and formats its
//! date for display.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use community_common::DEFAULT_DATE_FORMAT;
use community_core::{MessageRecord, StorageKey, UserId};
use tracing::instrument;

use super::context::ServiceContext;

/// Read-only lookup over the stored messages
#[derive(Debug, Clone)]
pub struct LastActivityLookup {
    ctx: ServiceContext,
}

impl LastActivityLookup {
    /// Create a new LastActivityLookup
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Timestamp of the latest message involving `user_id`
    #[instrument(skip(self, user_id), fields(user_id = %user_id))]
    pub async fn last_message_at(&self, user_id: &UserId) -> Option<DateTime<Utc>> {
        let messages: Vec<MessageRecord> = self.ctx.read_list(&StorageKey::Messages).await;
        latest_involving(&messages, user_id)
    }

    /// Display string of the latest message date, using the configured format
    pub async fn last_activity(&self, user_id: &UserId) -> Option<String> {
        let at = self.last_message_at(user_id).await?;
        Some(format_date(at, &self.ctx.config().date_format))
    }
}

/// Latest timestamp among the messages `user_id` took part in
pub(crate) fn latest_involving(messages: &[MessageRecord], user_id: &UserId) -> Option<DateTime<Utc>> {
    messages
        .iter()
        .filter(|msg| msg.involves(user_id))
        .map(|msg| msg.timestamp)
        .max()
}

/// Render `at` with `format`, falling back to the default format when the
/// pattern holds an unknown specifier
pub(crate) fn format_date(at: DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", at.format(format)).is_ok() {
        return out;
    }

    tracing::warn!(format = %format, "Invalid date format, using default");
    at.format(DEFAULT_DATE_FORMAT).to_string()
}
