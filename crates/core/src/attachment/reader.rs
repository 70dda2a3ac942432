//! Receive-side hook: restore offloaded bodies from blob storage.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::claim_check::{Shared, cancellable};
use super::error::AttachmentError;
use crate::message::Message;
use crate::storage::{BlobRef, BlobStore, StorageError};

/// Runs after a message is taken off the bus transport.
pub struct AttachmentReader<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for AttachmentReader<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: BlobStore> AttachmentReader<S> {
    pub(crate) fn new(shared: Arc<Shared<S>>) -> Self {
        Self { shared }
    }

    /// Replace the body with the referenced blob's content.
    ///
    /// Messages without the reference property are left untouched. The
    /// reference property stays on the message and the blob is not deleted;
    /// `_ValidUntilUtc` is not checked.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the reference is not a usable blob name,
    /// the blob is missing, or the download fails or comes back truncated.
    /// The message is unchanged on error.
    pub async fn after_receive(&self, message: &mut Message) -> Result<(), AttachmentError> {
        self.after_receive_with_cancellation(message, &CancellationToken::new())
            .await
    }

    /// [`after_receive`](Self::after_receive), abandoning storage calls once
    /// `cancel` fires. A cancelled call leaves the message unchanged.
    ///
    /// # Errors
    ///
    /// As `after_receive`, plus [`AttachmentError::Cancelled`].
    pub async fn after_receive_with_cancellation(
        &self,
        message: &mut Message,
        cancel: &CancellationToken,
    ) -> Result<(), AttachmentError> {
        let config = &self.shared.config;
        let property = config.reference_property_name();
        let Some(reference) = message.user_properties.get(property) else {
            debug!("message carries no attachment reference");
            return Ok(());
        };
        let blob = BlobRef::new(config.container_name(), blob_name(property, reference)?);

        let store = self.shared.client.get()?;
        cancellable(cancel, store.ensure_container(config.container_name())).await?;
        let attributes = cancellable(cancel, store.fetch_attributes(&blob)).await?;
        let body = cancellable(cancel, store.download(&blob)).await?;

        let actual = u64::try_from(body.len()).unwrap_or(u64::MAX);
        if actual != attributes.length {
            return Err(StorageError::LengthMismatch {
                key: blob.path(),
                expected: attributes.length,
                actual,
            }
            .into());
        }

        message.body = body;
        info!(
            blob = blob.name(),
            container = blob.container(),
            body_len = actual,
            "message body restored"
        );
        Ok(())
    }
}

/// Extract the blob name carried in the reference property.
fn blob_name(property: &str, reference: &Value) -> Result<String, StorageError> {
    match reference {
        Value::String(name) if name.trim().is_empty() => Err(StorageError::invalid_key(
            format!("property '{property}' holds a blank blob name"),
        )),
        Value::String(name) if name.contains('/') => Err(StorageError::invalid_key(format!(
            "property '{property}' holds '{name}', which escapes the container"
        ))),
        Value::String(name) => Ok(name.clone()),
        other => Err(StorageError::invalid_key(format!(
            "property '{property}' holds {other}, expected a blob name"
        ))),
    }
}
