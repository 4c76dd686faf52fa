//! Presence tracker
//!
//! Writes "last seen" markers for active users and derives the set of users
//! seen within the online threshold.

use std::collections::HashSet;

use community_core::{PresenceMarker, StorageKey, UserId, UserRecord};
use tracing::{debug, instrument, warn};

use super::context::ServiceContext;

/// Users seen within the threshold at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnlineSet {
    members: HashSet<UserId>,
    computed_at_ms: i64,
}

impl OnlineSet {
    /// Create an empty set computed at `computed_at_ms`
    #[must_use]
    pub fn empty(computed_at_ms: i64) -> Self {
        Self {
            members: HashSet::new(),
            computed_at_ms,
        }
    }

    #[inline]
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.members.contains(user_id)
    }

    /// Number of online users
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.members.iter()
    }

    /// Instant (epoch ms) the set was computed at
    pub fn computed_at(&self) -> i64 {
        self.computed_at_ms
    }

    fn insert(&mut self, user_id: UserId) {
        self.members.insert(user_id);
    }
}

impl<'a> IntoIterator for &'a OnlineSet {
    type Item = &'a UserId;
    type IntoIter = std::collections::hash_set::Iter<'a, UserId>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Presence tracker
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    ctx: ServiceContext,
}

impl PresenceTracker {
    /// Create a new PresenceTracker
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Get the service context
    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Record that a user is active now.
    ///
    /// A stored marker newer than the clock is kept as is. Storage failures are
    /// logged and swallowed.
    #[instrument(skip(self, user_id), fields(user_id = %user_id))]
    pub async fn mark_active(&self, user_id: &UserId) {
        let now = self.ctx.now_ms();
        let last_seen = match self.last_seen(user_id).await {
            Some(stored) if stored.last_seen_ms > now => stored.last_seen_ms,
            _ => now,
        };
        let marker = PresenceMarker::new(user_id.clone(), last_seen);

        match self.ctx.store().set(&marker.key(), &marker.encode()).await {
            Ok(()) => debug!(last_seen_ms = last_seen, "Marked active"),
            Err(e) => warn!(error = %e, "Failed to write presence marker"),
        }
    }

    /// Read the stored marker of a user
    pub async fn last_seen(&self, user_id: &UserId) -> Option<PresenceMarker> {
        let raw = self.ctx.read_raw(&StorageKey::last_seen(user_id)).await?;
        let marker = PresenceMarker::parse(user_id.clone(), &raw);
        if marker.is_none() {
            debug!(user_id = %user_id, "Ignoring unparsable presence marker");
        }
        marker
    }

    /// Derive the online set of `users` at `now_ms`.
    ///
    /// A user is online iff their marker is strictly newer than
    /// `now_ms - threshold_ms`. Missing or unparsable markers count as offline.
    #[instrument(skip(self, users), fields(users = users.len()))]
    pub async fn compute_online_set(
        &self,
        users: &[UserRecord],
        now_ms: i64,
        threshold_ms: i64,
    ) -> OnlineSet {
        let mut online = OnlineSet::empty(now_ms);

        for user in users {
            if let Some(marker) = self.last_seen(user.id()).await {
                if marker.is_fresh(now_ms, threshold_ms) {
                    online.insert(user.id().clone());
                }
            }
        }

        debug!(online = online.len(), "Online set computed");
        online
    }

    /// Derive the online set at the clock's current time and configured threshold
    pub async fn online_set_now(&self, users: &[UserRecord]) -> OnlineSet {
        let threshold = self.ctx.config().threshold_ms();
        self.compute_online_set(users, self.ctx.now_ms(), threshold)
            .await
    }

    /// Membership test
    #[inline]
    pub fn is_online(online: &OnlineSet, user_id: &UserId) -> bool {
        online.contains(user_id)
    }

    /// Read the registered users, degrading to an empty list
    pub async fn load_users(&self) -> Vec<UserRecord> {
        self.ctx.read_list(&StorageKey::RegisteredUsers).await
    }

    /// Read the logged-in user, if any
    pub async fn load_current_user(&self) -> Option<UserRecord> {
        self.ctx.read_record(&StorageKey::CurrentUser).await
    }
}
