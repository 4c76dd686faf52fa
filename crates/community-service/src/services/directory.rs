//! Community directory
//!
//! Composes what the community page shows from a session's state: one card per
//! registered member, the counters, and the messaging modal state.

use std::collections::HashMap;

use community_core::{MessageRecord, StorageKey, UserId, UserRecord};
use tracing::instrument;

use super::activity::{format_date, latest_involving};
use super::context::ServiceContext;
use super::error::DirectoryError;
use super::presence::OnlineSet;
use super::session::PresenceSession;
use crate::dto::{MemberCard, ModalInvocation};

/// Everything the page renders at one instant
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    users: Vec<UserRecord>,
    current_user: Option<UserRecord>,
    online: OnlineSet,
    last_activity: HashMap<UserId, String>,
}

impl DirectorySnapshot {
    /// Create a snapshot without message activity
    pub fn new(users: Vec<UserRecord>, current_user: Option<UserRecord>, online: OnlineSet) -> Self {
        Self {
            users,
            current_user,
            online,
            last_activity: HashMap::new(),
        }
    }

    /// Attach formatted last-activity dates
    #[must_use]
    pub fn with_activity(mut self, last_activity: HashMap<UserId, String>) -> Self {
        self.last_activity = last_activity;
        self
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn current_user(&self) -> Option<&UserRecord> {
        self.current_user.as_ref()
    }

    pub fn online(&self) -> &OnlineSet {
        &self.online
    }

    /// One card per registered member, in registry order
    pub fn member_cards(&self) -> Vec<MemberCard> {
        self.users
            .iter()
            .map(|user| {
                let is_current_user = self.is_current(user.id());
                let is_online = self.online.contains(user.id());
                let last_activity = if is_online || is_current_user {
                    None
                } else {
                    self.last_activity.get(user.id()).cloned()
                };

                MemberCard {
                    user: user.clone(),
                    is_current_user,
                    is_online,
                    last_activity,
                    can_message: self.current_user.is_some() && !is_current_user,
                }
            })
            .collect()
    }

    /// Number of registered members
    pub fn member_count(&self) -> usize {
        self.users.len()
    }

    /// Number of members currently online
    pub fn online_count(&self) -> usize {
        self.online.len()
    }

    /// Visitors who are not logged in get an invitation to join
    pub fn show_join_prompt(&self) -> bool {
        self.current_user.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn is_current(&self, user_id: &UserId) -> bool {
        self.current_user.as_ref().is_some_and(|me| me.is(user_id))
    }

    fn find(&self, user_id: &UserId) -> Option<&UserRecord> {
        self.users.iter().find(|user| user.is(user_id))
    }
}

/// Builds directory snapshots
#[derive(Debug, Clone)]
pub struct CommunityDirectory {
    ctx: ServiceContext,
}

impl CommunityDirectory {
    /// Create a new CommunityDirectory
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Snapshot a session's current state
    pub async fn snapshot(&self, session: &PresenceSession) -> DirectorySnapshot {
        self.compose(session.users(), session.current_user(), session.online())
            .await
    }

    /// Compose a snapshot, reading the stored messages once
    #[instrument(skip_all, fields(users = users.len()))]
    pub async fn compose(
        &self,
        users: Vec<UserRecord>,
        current_user: Option<UserRecord>,
        online: OnlineSet,
    ) -> DirectorySnapshot {
        let messages: Vec<MessageRecord> = self.ctx.read_list(&StorageKey::Messages).await;
        let format = &self.ctx.config().date_format;

        let last_activity = users
            .iter()
            .filter_map(|user| {
                latest_involving(&messages, user.id())
                    .map(|at| (user.id().clone(), format_date(at, format)))
            })
            .collect();

        DirectorySnapshot::new(users, current_user, online).with_activity(last_activity)
    }
}

/// Open/closed state of the messaging modal
#[derive(Debug, Clone, Default)]
pub struct MessagingModal {
    is_open: bool,
    recipient: Option<UserRecord>,
    current_user: Option<UserRecord>,
}

impl MessagingModal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the modal for a conversation with `recipient`
    pub fn open_for(
        &mut self,
        snapshot: &DirectorySnapshot,
        recipient: &UserId,
    ) -> Result<(), DirectoryError> {
        let me = snapshot.current_user().ok_or(DirectoryError::NoCurrentUser)?;
        if me.is(recipient) {
            return Err(DirectoryError::CannotMessageSelf);
        }
        let target = snapshot
            .find(recipient)
            .ok_or_else(|| DirectoryError::UnknownRecipient(recipient.clone()))?;

        self.recipient = Some(target.clone());
        self.current_user = Some(me.clone());
        self.is_open = true;
        Ok(())
    }

    /// Hide the modal; the last recipient is kept
    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn recipient(&self) -> Option<&UserRecord> {
        self.recipient.as_ref()
    }

    /// Arguments for the external modal
    pub fn invocation(&self) -> ModalInvocation {
        ModalInvocation {
            is_open: self.is_open,
            recipient: self.recipient.clone(),
            current_user: self.current_user.clone(),
        }
    }
}
