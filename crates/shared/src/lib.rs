//! Shared configuration for the claim-check attachment pipeline.
//!
//! This crate provides the settings every other crate reads at startup:
//! - Storage provider connection parameters
//! - Attachment protocol settings (container, reference property, threshold)

pub mod config;

pub use config::{AppConfig, AttachmentSettings, StorageProvider};
