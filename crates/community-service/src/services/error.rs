//! Directory error types

use community_core::UserId;

/// Reasons the messaging modal refuses to open
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("No user is logged in")]
    NoCurrentUser,

    #[error("Cannot message yourself")]
    CannotMessageSelf,

    #[error("Unknown recipient: {0}")]
    UnknownRecipient(UserId),
}

impl DirectoryError {
    /// Get the error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoCurrentUser => "NO_CURRENT_USER",
            Self::CannotMessageSelf => "CANNOT_MESSAGE_SELF",
            Self::UnknownRecipient(_) => "UNKNOWN_RECIPIENT",
        }
    }
}
