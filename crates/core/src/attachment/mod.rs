//! Claim-check attachments for bus messages.
//!
//! This module implements the offload/restore protocol:
//! - Threshold decision (caller-supplied predicate, evaluated once)
//! - Offload of the body to a freshly named blob, with `_MessageId` and
//!   `_ValidUntilUtc` metadata
//! - Restore of the body from the blob named in the reference property
//!
//! # Message states
//!
//! ```text
//! before_send:   {body, no reference} ──► {body, no reference}   (below threshold)
//!                                     └─► {empty, reference}     (offloaded)
//! after_receive: {empty, reference}   ──► {body, reference}
//! ```
//!
//! A failed or cancelled hook leaves the message as it was, so the whole
//! hook can be retried. Retried sends upload a new blob; the old one is
//! left for external retention.

mod claim_check;
mod config;
mod error;
mod hooks;
pub mod metadata;
mod reader;
mod writer;

#[cfg(test)]
mod props;

pub use claim_check::ClaimCheck;
pub use config::{AttachmentConfig, ThresholdPredicate, body_longer_than};
pub use error::AttachmentError;
pub use hooks::{IncomingHook, OutgoingHook};
pub use metadata::{AttachmentMetadata, MESSAGE_ID_KEY, VALID_UNTIL_UTC_KEY};
pub use reader::AttachmentReader;
pub use writer::AttachmentWriter;
