//! Wiring shared by the writer and reader.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::config::AttachmentConfig;
use super::error::AttachmentError;
use super::reader::AttachmentReader;
use super::writer::AttachmentWriter;
use crate::clock::{Clock, SystemClock};
use crate::storage::{BlobStore, LazyBlobClient, OpendalBlobStore, StorageError};

/// State shared by every hook invocation. Read-only after construction.
pub(crate) struct Shared<S> {
    pub(crate) config: AttachmentConfig,
    pub(crate) client: LazyBlobClient<S>,
    pub(crate) clock: Arc<dyn Clock>,
}

/// Entry point: validated configuration, injected clock and a lazily built
/// blob client, handing out the send-side and receive-side hooks.
///
/// Writers and readers obtained from the same `ClaimCheck` share one blob
/// client.
pub struct ClaimCheck<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for ClaimCheck<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl ClaimCheck<OpendalBlobStore> {
    /// Use OpenDAL against the configured connection and the wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::Configuration`] if the configuration is invalid.
    pub fn from_config(config: AttachmentConfig) -> Result<Self, AttachmentError> {
        let provider = config.connection().clone();
        Self::new(
            config,
            move || OpendalBlobStore::from_provider(&provider),
            SystemClock,
        )
    }
}

impl<S: BlobStore> ClaimCheck<S> {
    /// Create from a configuration, a blob client factory and a clock.
    ///
    /// The factory is not called until a hook first needs storage.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::Configuration`] if the configuration is invalid.
    pub fn new<F, C>(config: AttachmentConfig, factory: F, clock: C) -> Result<Self, AttachmentError>
    where
        F: Fn() -> Result<S, StorageError> + Send + Sync + 'static,
        C: Clock + 'static,
    {
        Self::with_client(config, LazyBlobClient::new(factory), clock)
    }

    /// Create around an existing lazy client.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::Configuration`] if the configuration is invalid.
    pub fn with_client<C>(
        config: AttachmentConfig,
        client: LazyBlobClient<S>,
        clock: C,
    ) -> Result<Self, AttachmentError>
    where
        C: Clock + 'static,
    {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                client,
                clock: Arc::new(clock),
            }),
        })
    }

    /// The send-side hook.
    #[must_use]
    pub fn writer(&self) -> AttachmentWriter<S> {
        AttachmentWriter::new(Arc::clone(&self.shared))
    }

    /// The receive-side hook.
    #[must_use]
    pub fn reader(&self) -> AttachmentReader<S> {
        AttachmentReader::new(Arc::clone(&self.shared))
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &AttachmentConfig {
        &self.shared.config
    }

    /// The blob client, constructing it on first use.
    ///
    /// # Errors
    ///
    /// Returns the factory's error when construction fails.
    pub fn store(&self) -> Result<&S, StorageError> {
        self.shared.client.get()
    }
}

/// Race a storage call against the caller's cancellation token.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T, StorageError>>,
) -> Result<T, AttachmentError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AttachmentError::Cancelled),
        result = operation => result.map_err(AttachmentError::from),
    }
}
