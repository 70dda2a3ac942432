//! Lazily constructed blob client shared by the hooks.

use std::fmt;

use once_cell::sync::OnceCell;

use super::error::StorageError;

type Factory<S> = Box<dyn Fn() -> Result<S, StorageError> + Send + Sync>;

/// Blob client built from a factory on first use.
///
/// The factory runs at most once successfully, even under concurrent first
/// use. A failed construction is not cached, so the next call retries.
pub struct LazyBlobClient<S> {
    factory: Factory<S>,
    client: OnceCell<S>,
}

impl<S> LazyBlobClient<S> {
    /// Wrap a client factory.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<S, StorageError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            client: OnceCell::new(),
        }
    }

    /// Wrap an already constructed client.
    pub fn ready(client: S) -> Self {
        Self {
            factory: Box::new(|| {
                Err(StorageError::configuration(
                    "blob client was supplied pre-built",
                ))
            }),
            client: OnceCell::with_value(client),
        }
    }

    /// Get the client, constructing it if this is the first use.
    ///
    /// # Errors
    ///
    /// Returns the factory's error when construction fails.
    pub fn get(&self) -> Result<&S, StorageError> {
        self.client.get_or_try_init(|| (self.factory)())
    }

    /// Whether the client has been constructed.
    pub fn is_initialized(&self) -> bool {
        self.client.get().is_some()
    }
}

impl<S> fmt::Debug for LazyBlobClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyBlobClient")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
