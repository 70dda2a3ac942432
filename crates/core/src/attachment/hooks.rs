//! Pipeline-facing hook traits.
//!
//! A bus client registers one [`OutgoingHook`] to run before every send and
//! one [`IncomingHook`] to run after every receive. The hooks decide for
//! themselves whether a message needs attention.

use std::future::Future;

use super::error::AttachmentError;
use super::reader::AttachmentReader;
use super::writer::AttachmentWriter;
use crate::message::Message;
use crate::storage::BlobStore;

/// Runs on every outbound message before transport send.
pub trait OutgoingHook: Send + Sync {
    /// Transform `message` in place before it is sent.
    fn before_send(
        &self,
        message: &mut Message,
    ) -> impl Future<Output = Result<(), AttachmentError>> + Send;
}

/// Runs on every inbound message after transport receive.
pub trait IncomingHook: Send + Sync {
    /// Transform `message` in place before it reaches the handler.
    fn after_receive(
        &self,
        message: &mut Message,
    ) -> impl Future<Output = Result<(), AttachmentError>> + Send;
}

impl<S: BlobStore> OutgoingHook for AttachmentWriter<S> {
    async fn before_send(&self, message: &mut Message) -> Result<(), AttachmentError> {
        AttachmentWriter::before_send(self, message).await
    }
}

impl<S: BlobStore> IncomingHook for AttachmentReader<S> {
    async fn after_receive(&self, message: &mut Message) -> Result<(), AttachmentError> {
        AttachmentReader::after_receive(self, message).await
    }
}
