//! Blob storage for offloaded message bodies, using Apache OpenDAL.
//!
//! This module provides the storage capability the attachment hooks need,
//! and a vendor-agnostic implementation of it:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development only)
//! - In-process memory
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    BlobStore (hook-facing)                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ ensure_container(name)     │ fetch_attributes(blob)             │
//! │ upload(blob, bytes)        │ download(blob)                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                      Apache OpenDAL                              │
//! │ op.create_dir("c/")  op.write_with("c/n")  op.stat  op.read      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod blob;
mod client;
mod error;
mod service;

pub use blob::{BlobAttributes, BlobRef, BlobStore};
pub use claimcheck_shared::StorageProvider;
pub use client::LazyBlobClient;
pub use error::StorageError;
pub use service::OpendalBlobStore;
