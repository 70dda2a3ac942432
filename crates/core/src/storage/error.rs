//! Storage error types.

use thiserror::Error;

/// Blob storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Blob or container not found in storage.
    #[error("blob not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Reported blob length disagrees with the downloaded content.
    #[error("blob {key} reported {expected} bytes but {actual} bytes were downloaded")]
    LengthMismatch {
        /// Storage key.
        key: String,
        /// Length from the blob attributes.
        expected: u64,
        /// Length of the downloaded content.
        actual: u64,
    },

    /// Blob metadata entry could not be interpreted.
    #[error("invalid metadata {entry} on blob {key}: {reason}")]
    InvalidMetadata {
        /// Storage key.
        key: String,
        /// Metadata entry name.
        entry: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Invalid blob reference.
    #[error("invalid blob reference: {0}")]
    InvalidKey(String),

    /// Operation not supported by the storage provider.
    #[error("operation not supported by storage provider: {0}")]
    Unsupported(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an invalid reference error.
    #[must_use]
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// Create an invalid metadata error.
    #[must_use]
    pub fn invalid_metadata(
        key: impl Into<String>,
        entry: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidMetadata {
            key: key.into(),
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Convert an OpenDAL error raised while working on `key`.
    #[must_use]
    pub fn at(key: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(key),
            _ => Self::from_opendal(err),
        }
    }

    fn from_opendal(err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::Unsupported(err.to_string()),
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }

    /// Whether the error means the blob does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        Self::from_opendal(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opendal::ErrorKind;

    #[test]
    fn test_not_found_keeps_key() {
        let err = StorageError::at(
            "attachments/abc",
            &opendal::Error::new(ErrorKind::NotFound, "missing"),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "blob not found: attachments/abc");
    }

    #[test]
    fn test_opendal_kinds_map_to_variants() {
        let unsupported: StorageError =
            opendal::Error::new(ErrorKind::Unsupported, "no metadata").into();
        assert!(matches!(unsupported, StorageError::Unsupported(_)));

        let config: StorageError = opendal::Error::new(ErrorKind::ConfigInvalid, "bad").into();
        assert!(matches!(config, StorageError::Configuration(_)));

        let other: StorageError = opendal::Error::new(ErrorKind::Unexpected, "boom").into();
        assert!(matches!(other, StorageError::Operation(_)));
    }

    #[test]
    fn test_length_mismatch_display() {
        let err = StorageError::LengthMismatch {
            key: "attachments/abc".to_string(),
            expected: 10,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "blob attachments/abc reported 10 bytes but 4 bytes were downloaded"
        );
    }
}
