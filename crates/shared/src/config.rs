//! Application configuration management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Blob storage connection parameters.
    pub storage: StorageProvider,
    /// Claim-check attachment settings.
    #[serde(default)]
    pub attachment: AttachmentSettings,
}

/// Storage provider configuration.
///
/// These are the connection parameters handed to the blob client factory.
/// The claim-check protocol never looks inside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container that holds the attachment containers.
        container: String,
        /// Custom endpoint (Azurite, sovereign clouds).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory, lost on exit (tests and dry runs)
    Memory,
}

impl StorageProvider {
    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
            endpoint: None,
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

/// Claim-check attachment settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttachmentSettings {
    /// Blob container that receives offloaded bodies.
    #[serde(default = "default_container_name")]
    pub container_name: String,
    /// Message property carrying the blob name.
    #[serde(default = "default_reference_property_name")]
    pub reference_property_name: String,
    /// Bodies strictly longer than this many bytes are offloaded.
    #[serde(default = "default_threshold_bytes")]
    pub threshold_bytes: usize,
}

fn default_container_name() -> String {
    "attachments".to_string()
}

fn default_reference_property_name() -> String {
    "$attachment.blob".to_string()
}

fn default_threshold_bytes() -> usize {
    192 * 1024
}

impl Default for AttachmentSettings {
    fn default() -> Self {
        Self {
            container_name: default_container_name(),
            reference_property_name: default_reference_property_name(),
            threshold_bytes: default_threshold_bytes(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CLAIMCHECK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        StorageProvider::s3("https://account.r2.cloudflarestorage.com", "b", "k", "s", "auto"),
        "s3"
    )]
    #[case(StorageProvider::azure_blob("devaccount", "key", "bus"), "azure_blob")]
    #[case(StorageProvider::local_fs("./storage"), "local")]
    #[case(StorageProvider::Memory, "memory")]
    fn test_provider_name(#[case] provider: StorageProvider, #[case] expected: &str) {
        assert_eq!(provider.name(), expected);
    }

    #[test]
    fn test_attachment_settings_defaults() {
        let settings = AttachmentSettings::default();
        assert_eq!(settings.container_name, "attachments");
        assert_eq!(settings.reference_property_name, "$attachment.blob");
        assert_eq!(settings.threshold_bytes, 196_608);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("CLAIMCHECK__STORAGE__TYPE", Some("local_fs")),
                ("CLAIMCHECK__STORAGE__ROOT", Some("/var/lib/claimcheck")),
                ("CLAIMCHECK__ATTACHMENT__CONTAINER_NAME", Some("orders")),
                ("CLAIMCHECK__ATTACHMENT__THRESHOLD_BYTES", Some("1024")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(
                    config.storage,
                    StorageProvider::local_fs("/var/lib/claimcheck")
                );
                assert_eq!(config.attachment.container_name, "orders");
                assert_eq!(config.attachment.threshold_bytes, 1024);
                assert_eq!(config.attachment.reference_property_name, "$attachment.blob");
            },
        );
    }

    #[test]
    fn test_load_memory_provider_uses_default_settings() {
        temp_env::with_vars([("CLAIMCHECK__STORAGE__TYPE", Some("memory"))], || {
            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.storage, StorageProvider::Memory);
            assert_eq!(config.attachment, AttachmentSettings::default());
        });
    }

    #[test]
    fn test_load_without_storage_fails() {
        temp_env::with_vars_unset(["CLAIMCHECK__STORAGE__TYPE"], || {
            assert!(AppConfig::load().is_err());
        });
    }
}
