//! User ID - the email address a member registered with
//!
//! Emails are compared verbatim; no case folding or normalization is applied.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Unique identifier of a registered member (their email)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId without validation
    #[inline]
    pub fn new(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    /// Parse a UserId, rejecting blank input
    pub fn parse(email: &str) -> Result<Self, DomainError> {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidUserId(email.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the underlying email
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the inner String value
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for UserId {
    fn from(email: String) -> Self {
        Self(email)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for UserId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for UserId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
