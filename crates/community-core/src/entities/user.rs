//! User record - a member as written by the registration flow

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// Registered member of the community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    pub email: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UserRecord {
    /// Create a new UserRecord with required fields
    pub fn new(name: impl Into<String>, email: impl Into<UserId>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            profile_image: None,
            description: None,
        }
    }

    /// Set the profile image URI
    #[must_use]
    pub fn with_profile_image(mut self, uri: impl Into<String>) -> Self {
        self.profile_image = Some(uri.into());
        self
    }

    /// Set the free-form description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The member's unique identifier
    #[inline]
    pub fn id(&self) -> &UserId {
        &self.email
    }

    /// Check if this record belongs to the given user
    #[inline]
    pub fn is(&self, user_id: &UserId) -> bool {
        &self.email == user_id
    }

    /// First character of the display name, used when no image is set
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next()
    }
}
