//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),

    #[error("Malformed value under {key}: {reason}")]
    MalformedValue { key: String, reason: String },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Notification channel closed")]
    NotificationClosed,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUserId(_) => "INVALID_USER_ID",
            Self::MalformedValue { .. } => "MALFORMED_VALUE",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
            Self::NotificationClosed => "NOTIFICATION_CLOSED",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a storage backend error
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable(_) | Self::StorageError(_) | Self::NotificationClosed
        )
    }

    /// Check if the stored data itself is bad
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedValue { .. } | Self::SerializationError(_)
        )
    }

    /// Create a malformed value error for a key
    pub fn malformed(key: impl ToString, reason: impl ToString) -> Self {
        Self::MalformedValue {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
