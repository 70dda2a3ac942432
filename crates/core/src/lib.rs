//! Claim-check attachment protocol for message buses.
//!
//! Large message bodies are moved to blob storage before send and replaced by
//! a reference property; on receive the reference is resolved back into the
//! original body. The bus transport and the blob backend are collaborators;
//! this crate owns the decision logic and the wire-visible protocol.
//!
//! # Modules
//!
//! - `message` - Message envelope and time to live
//! - `clock` - Injectable time source
//! - `storage` - Blob store capability and its OpenDAL implementation
//! - `attachment` - Send and receive hooks

pub mod attachment;
pub mod clock;
pub mod message;
pub mod storage;

pub use attachment::{
    AttachmentConfig, AttachmentError, AttachmentReader, AttachmentWriter, ClaimCheck,
    IncomingHook, OutgoingHook,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use message::{Message, TimeToLive};
pub use storage::{BlobStore, OpendalBlobStore, StorageError, StorageProvider};
