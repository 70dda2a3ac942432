//! Blob handles and the blob store capability.

use std::collections::BTreeMap;
use std::future::Future;

use bytes::Bytes;

use super::error::StorageError;

/// Handle to a named blob inside a container.
///
/// Creating a handle is local; nothing touches storage until the handle is
/// passed to a [`BlobStore`]. Metadata set on the handle is written together
/// with the content on upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    container: String,
    name: String,
    metadata: BTreeMap<String, String>,
}

impl BlobRef {
    /// Reference blob `name` in `container`.
    #[must_use]
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Container name.
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Blob name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage key: `{container}/{name}`.
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}/{}", self.container, self.name)
    }

    /// Attach a metadata entry. Must happen before upload.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Metadata to be written on upload.
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

/// Attributes of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlobAttributes {
    /// Content length in bytes.
    pub length: u64,
    /// Metadata written at upload time.
    pub metadata: BTreeMap<String, String>,
}

impl BlobAttributes {
    /// Look up a metadata entry.
    ///
    /// Falls back to an ASCII case-insensitive match, since S3 returns user
    /// metadata keys lowercased.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .or_else(|| {
                self.metadata
                    .iter()
                    .find(|(stored, _)| stored.eq_ignore_ascii_case(key))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }
}

/// Blob storage capability used by the attachment hooks.
///
/// Implementations must be safe to share across concurrent hook invocations.
pub trait BlobStore: Send + Sync {
    /// Create the container if it does not exist yet. Idempotent.
    fn ensure_container(
        &self,
        container: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Write `data` and the handle's metadata to the blob.
    fn upload(
        &self,
        blob: &BlobRef,
        data: Bytes,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Read length and metadata without downloading content.
    fn fetch_attributes(
        &self,
        blob: &BlobRef,
    ) -> impl Future<Output = Result<BlobAttributes, StorageError>> + Send;

    /// Download the full content.
    fn download(&self, blob: &BlobRef) -> impl Future<Output = Result<Bytes, StorageError>> + Send;
}
