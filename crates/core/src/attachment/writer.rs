//! Send-side hook: offload oversized bodies to blob storage.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::claim_check::{Shared, cancellable};
use super::error::AttachmentError;
use super::metadata::AttachmentMetadata;
use crate::message::Message;
use crate::storage::{BlobRef, BlobStore};

/// Runs before a message is handed to the bus transport.
pub struct AttachmentWriter<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for AttachmentWriter<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: BlobStore> AttachmentWriter<S> {
    pub(crate) fn new(shared: Arc<Shared<S>>) -> Self {
        Self { shared }
    }

    /// Offload the body if the threshold predicate fires.
    ///
    /// Messages below the threshold are left untouched and cause no storage
    /// traffic. Otherwise the body is uploaded under a fresh blob name, the
    /// body is cleared and the reference property set.
    ///
    /// # Errors
    ///
    /// Returns an error if the expiry cannot be computed or storage fails.
    /// The message is unchanged on error.
    pub async fn before_send(&self, message: &mut Message) -> Result<(), AttachmentError> {
        self.before_send_with_cancellation(message, &CancellationToken::new())
            .await
    }

    /// [`before_send`](Self::before_send), abandoning storage calls once
    /// `cancel` fires. A cancelled call leaves the message unchanged; the
    /// uploaded blob, if any, is orphaned.
    ///
    /// # Errors
    ///
    /// As `before_send`, plus [`AttachmentError::Cancelled`].
    pub async fn before_send_with_cancellation(
        &self,
        message: &mut Message,
        cancel: &CancellationToken,
    ) -> Result<(), AttachmentError> {
        let config = &self.shared.config;
        if !config.size_exceeds_threshold(message) {
            debug!(
                body_len = message.body.len(),
                "message below offload threshold"
            );
            return Ok(());
        }

        let metadata = AttachmentMetadata::for_message(message, self.shared.clock.now())?;
        let store = self.shared.client.get()?;

        cancellable(cancel, store.ensure_container(config.container_name())).await?;

        let mut blob = BlobRef::new(config.container_name(), Uuid::new_v4().to_string());
        metadata.apply_to(&mut blob);

        let body = message.body.clone();
        let body_len = body.len();
        cancellable(cancel, store.upload(&blob, body)).await?;

        // no await below: clearing the body and setting the reference is one step
        message.body = Bytes::new();
        message.user_properties.insert(
            config.reference_property_name().to_string(),
            Value::String(blob.name().to_string()),
        );

        info!(
            blob = blob.name(),
            container = blob.container(),
            body_len,
            message_id = metadata.message_id.as_deref(),
            "message body offloaded"
        );
        Ok(())
    }
}
