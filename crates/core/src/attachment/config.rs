//! Attachment protocol configuration.

use std::fmt;
use std::sync::Arc;

use claimcheck_shared::{AttachmentSettings, StorageProvider};

use super::error::AttachmentError;
use crate::message::Message;

/// Decides whether a message is large enough to offload.
pub type ThresholdPredicate = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

/// Offload when the body is strictly longer than `limit` bytes.
#[must_use]
pub fn body_longer_than(limit: usize) -> ThresholdPredicate {
    Arc::new(move |message: &Message| message.body.len() > limit)
}

/// Claim-check configuration, shared read-only by writer and reader.
#[derive(Clone)]
pub struct AttachmentConfig {
    connection: StorageProvider,
    container_name: String,
    reference_property_name: String,
    size_exceeds_threshold: ThresholdPredicate,
}

impl AttachmentConfig {
    /// Default blob container.
    pub const DEFAULT_CONTAINER_NAME: &'static str = "attachments";
    /// Default message property carrying the blob name.
    pub const DEFAULT_REFERENCE_PROPERTY_NAME: &'static str = "$attachment.blob";

    /// Create a configuration with default container and property names.
    #[must_use]
    pub fn new<F>(connection: StorageProvider, size_exceeds_threshold: F) -> Self
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        Self {
            connection,
            container_name: Self::DEFAULT_CONTAINER_NAME.to_string(),
            reference_property_name: Self::DEFAULT_REFERENCE_PROPERTY_NAME.to_string(),
            size_exceeds_threshold: Arc::new(size_exceeds_threshold),
        }
    }

    /// Build from loaded application settings, offloading bodies longer
    /// than `settings.threshold_bytes`.
    #[must_use]
    pub fn from_settings(connection: StorageProvider, settings: &AttachmentSettings) -> Self {
        Self {
            connection,
            container_name: settings.container_name.clone(),
            reference_property_name: settings.reference_property_name.clone(),
            size_exceeds_threshold: body_longer_than(settings.threshold_bytes),
        }
    }

    /// Set the blob container name.
    #[must_use]
    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = name.into();
        self
    }

    /// Set the reference property name.
    #[must_use]
    pub fn with_reference_property_name(mut self, name: impl Into<String>) -> Self {
        self.reference_property_name = name.into();
        self
    }

    /// Check the configuration before any hook runs.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a blank container or property name,
    /// or a container name containing `/`.
    pub fn validate(&self) -> Result<(), AttachmentError> {
        if self.container_name.trim().is_empty() {
            return Err(AttachmentError::configuration(
                "container name must not be blank",
            ));
        }
        if self.container_name.contains('/') {
            return Err(AttachmentError::configuration(format!(
                "container name '{}' must not contain '/'",
                self.container_name
            )));
        }
        if self.reference_property_name.trim().is_empty() {
            return Err(AttachmentError::configuration(
                "reference property name must not be blank",
            ));
        }
        Ok(())
    }

    /// Storage connection parameters.
    #[must_use]
    pub fn connection(&self) -> &StorageProvider {
        &self.connection
    }

    /// Blob container name.
    #[must_use]
    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// Message property carrying the blob name.
    #[must_use]
    pub fn reference_property_name(&self) -> &str {
        &self.reference_property_name
    }

    /// Evaluate the offload threshold for `message`.
    #[must_use]
    pub fn size_exceeds_threshold(&self, message: &Message) -> bool {
        (self.size_exceeds_threshold)(message)
    }
}

impl fmt::Debug for AttachmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentConfig")
            .field("provider", &self.connection.name())
            .field("container_name", &self.container_name)
            .field("reference_property_name", &self.reference_property_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = AttachmentConfig::new(StorageProvider::Memory, |_: &Message| true);
        assert_eq!(config.container_name(), "attachments");
        assert_eq!(config.reference_property_name(), "$attachment.blob");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_settings_uses_threshold() {
        let settings = AttachmentSettings {
            container_name: "orders".to_string(),
            reference_property_name: "AttachmentId".to_string(),
            threshold_bytes: 4,
        };
        let config = AttachmentConfig::from_settings(StorageProvider::Memory, &settings);

        assert_eq!(config.container_name(), "orders");
        assert_eq!(config.reference_property_name(), "AttachmentId");
        assert!(!config.size_exceeds_threshold(&Message::new(vec![0u8; 4])));
        assert!(config.size_exceeds_threshold(&Message::new(vec![0u8; 5])));
    }

    #[rstest]
    #[case("", "$attachment.blob")]
    #[case("   ", "$attachment.blob")]
    #[case("a/b", "$attachment.blob")]
    #[case("attachments", "")]
    #[case("attachments", " \t")]
    fn test_validate_rejects(#[case] container: &str, #[case] property: &str) {
        let config = AttachmentConfig::new(StorageProvider::Memory, |_: &Message| true)
            .with_container_name(container)
            .with_reference_property_name(property);
        assert!(matches!(
            config.validate(),
            Err(AttachmentError::Configuration(_))
        ));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let config = AttachmentConfig::new(
            StorageProvider::azure_blob("account", "super-secret", "bus"),
            |_: &Message| false,
        );
        let rendered = format!("{config:?}");
        assert!(rendered.contains("azure_blob"));
        assert!(!rendered.contains("super-secret"));
    }
}
