//! Attachment error types.

use std::time::Duration;

use thiserror::Error;

use crate::storage::StorageError;

/// Attachment hook errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Configuration rejected at construction.
    #[error("invalid attachment configuration: {0}")]
    Configuration(String),

    /// `now + time_to_live` is outside the representable range.
    #[error("time to live {0:?} cannot be turned into an expiry timestamp")]
    InvalidTimeToLive(Duration),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The caller cancelled the operation.
    #[error("attachment operation cancelled")]
    Cancelled,
}

impl AttachmentError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// The storage error behind this failure, if any.
    #[must_use]
    pub const fn as_storage(&self) -> Option<&StorageError> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}
