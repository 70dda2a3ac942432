//! Blob store implementation using Apache OpenDAL.

use std::collections::BTreeMap;

use bytes::Bytes;
use claimcheck_shared::StorageProvider;
use opendal::{Builder, ErrorKind, Operator, services};
use tracing::{debug, warn};

use super::blob::{BlobAttributes, BlobRef, BlobStore};
use super::error::StorageError;

/// Suffix of the JSON object holding metadata on backends without user metadata.
const METADATA_SIDECAR_SUFFIX: &str = ".metadata.json";

/// Blob store backed by an OpenDAL operator.
///
/// Containers are top-level directories below the provider's bucket or
/// container, so `attachments/<uuid>` is the key of a blob named `<uuid>` in
/// container `attachments`.
#[derive(Debug, Clone)]
pub struct OpendalBlobStore {
    operator: Operator,
    native_metadata: bool,
    create_dir: bool,
}

impl OpendalBlobStore {
    /// Create a blob store from provider connection parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_provider(provider: &StorageProvider) -> Result<Self, StorageError> {
        let operator = Self::create_operator(provider)?;
        debug!(provider = provider.name(), "blob store initialized");
        Ok(Self::from_operator(operator))
    }

    /// Wrap an already configured operator.
    #[must_use]
    pub fn from_operator(operator: Operator) -> Self {
        let capability = operator.info().full_capability();
        if !capability.write_with_user_metadata {
            warn!(
                scheme = %operator.info().scheme(),
                "backend has no user metadata, using {METADATA_SIDECAR_SUFFIX} sidecars"
            );
        }
        Self {
            native_metadata: capability.write_with_user_metadata,
            create_dir: capability.create_dir,
            operator,
        }
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => finish(
                services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region),
            ),
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
                endpoint,
            } => {
                let mut builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }
                finish(builder)
            }
            StorageProvider::LocalFs { root } => finish(
                services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                ),
            ),
            StorageProvider::Memory => finish(services::Memory::default()),
        }
    }

    /// Whether metadata is stored natively or in a sidecar object.
    #[must_use]
    pub fn has_native_metadata(&self) -> bool {
        self.native_metadata
    }

    async fn read_sidecar(&self, blob: &BlobRef) -> Result<BTreeMap<String, String>, StorageError> {
        let key = sidecar_path(blob);
        match self.operator.read(&key).await {
            Ok(buffer) => serde_json::from_slice(&buffer.to_bytes()).map_err(|e| {
                StorageError::invalid_metadata(blob.path(), "metadata sidecar", e.to_string())
            }),
            // blob was uploaded without metadata
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::at(&key, &e)),
        }
    }
}

impl BlobStore for OpendalBlobStore {
    async fn ensure_container(&self, container: &str) -> Result<(), StorageError> {
        if !self.create_dir {
            return Ok(());
        }
        let key = format!("{container}/");
        self.operator
            .create_dir(&key)
            .await
            .map_err(|e| StorageError::at(&key, &e))
    }

    async fn upload(&self, blob: &BlobRef, data: Bytes) -> Result<(), StorageError> {
        let key = blob.path();
        let metadata = blob.metadata();

        let written = if metadata.is_empty() {
            self.operator.write(&key, data).await
        } else if self.native_metadata {
            self.operator
                .write_with(&key, data)
                .user_metadata(metadata.clone())
                .await
        } else {
            let sidecar = serde_json::to_vec(metadata)
                .map_err(|e| StorageError::operation(e.to_string()))?;
            let sidecar_key = sidecar_path(blob);
            self.operator
                .write(&sidecar_key, sidecar)
                .await
                .map_err(|e| StorageError::at(&sidecar_key, &e))?;
            self.operator.write(&key, data).await
        };
        written
            .map(|_| ())
            .map_err(|e| StorageError::at(&key, &e))
    }

    async fn fetch_attributes(&self, blob: &BlobRef) -> Result<BlobAttributes, StorageError> {
        let key = blob.path();
        let meta = self
            .operator
            .stat(&key)
            .await
            .map_err(|e| StorageError::at(&key, &e))?;

        let metadata: BTreeMap<String, String> = if self.native_metadata {
            meta.user_metadata()
                .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default()
        } else {
            self.read_sidecar(blob).await?
        };

        Ok(BlobAttributes {
            length: meta.content_length(),
            metadata,
        })
    }

    async fn download(&self, blob: &BlobRef) -> Result<Bytes, StorageError> {
        let key = blob.path();
        self.operator
            .read(&key)
            .await
            .map(|buffer| buffer.to_bytes())
            .map_err(|e| StorageError::at(&key, &e))
    }
}

fn finish<B: Builder>(builder: B) -> Result<Operator, StorageError> {
    Ok(Operator::new(builder)
        .map_err(|e| StorageError::configuration(e.to_string()))?
        .finish())
}

fn sidecar_path(blob: &BlobRef) -> String {
    format!("{}{METADATA_SIDECAR_SUFFIX}", blob.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> OpendalBlobStore {
        OpendalBlobStore::from_provider(&StorageProvider::Memory).expect("memory store")
    }

    fn blob_with_metadata(name: &str) -> BlobRef {
        let mut blob = BlobRef::new("attachments", name);
        blob.set_metadata("_MessageId", "order-42");
        blob.set_metadata("_ValidUntilUtc", "2024-01-01 01:00:00.000000 Z");
        blob
    }

    #[tokio::test]
    async fn test_memory_upload_and_download() {
        let store = memory_store();
        let blob = blob_with_metadata("first");

        store.ensure_container("attachments").await.expect("container");
        store
            .upload(&blob, Bytes::from_static(b"payload"))
            .await
            .expect("upload");

        let attributes = store.fetch_attributes(&blob).await.expect("attributes");
        assert_eq!(attributes.length, 7);
        assert_eq!(attributes.metadata_value("_MessageId"), Some("order-42"));
        assert_eq!(
            attributes.metadata_value("_ValidUntilUtc"),
            Some("2024-01-01 01:00:00.000000 Z")
        );

        let content = store.download(&blob).await.expect("download");
        assert_eq!(content.as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_upload_without_metadata_has_empty_attributes() {
        let store = memory_store();
        let blob = BlobRef::new("attachments", "plain");

        store.upload(&blob, Bytes::new()).await.expect("upload");

        let attributes = store.fetch_attributes(&blob).await.expect("attributes");
        assert_eq!(attributes.length, 0);
        assert!(attributes.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let store = memory_store();
        let blob = BlobRef::new("attachments", "missing");

        let err = store.fetch_attributes(&blob).await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");

        let err = store.download(&blob).await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_local_fs_container_and_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store =
            OpendalBlobStore::from_provider(&StorageProvider::local_fs(dir.path())).expect("fs");
        let blob = blob_with_metadata("on-disk");

        store.ensure_container("attachments").await.expect("container");
        store.ensure_container("attachments").await.expect("idempotent");
        assert!(dir.path().join("attachments").is_dir());

        store
            .upload(&blob, Bytes::from_static(b"0123456789"))
            .await
            .expect("upload");
        assert!(dir.path().join("attachments/on-disk").is_file());
        if !store.has_native_metadata() {
            assert!(dir.path().join("attachments/on-disk.metadata.json").is_file());
        }

        let attributes = store.fetch_attributes(&blob).await.expect("attributes");
        assert_eq!(attributes.length, 10);
        assert_eq!(attributes.metadata, blob.metadata().clone());
    }
}
