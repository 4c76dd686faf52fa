//! Response DTOs

use community_core::{UserId, UserRecord};
use serde::Serialize;

/// One member as shown on the community page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberCard {
    pub user: UserRecord,
    pub is_current_user: bool,
    pub is_online: bool,
    /// Date of the latest message, only for offline members other than the viewer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
    pub can_message: bool,
}

impl MemberCard {
    /// Member id
    pub fn id(&self) -> &UserId {
        self.user.id()
    }
}

/// Arguments for the external messaging modal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalInvocation {
    pub is_open: bool,
    pub recipient: Option<UserRecord>,
    pub current_user: Option<UserRecord>,
}
