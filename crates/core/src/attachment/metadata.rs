//! Metadata written on offloaded blobs.
//!
//! Two reserved entries travel with every blob, never with the message:
//!
//! | Key              | Value                                        |
//! |------------------|----------------------------------------------|
//! | `_MessageId`     | id of the message the body came from         |
//! | `_ValidUntilUtc` | `yyyy-MM-dd HH:mm:ss.ffffff Z`, UTC          |
//!
//! Either entry may be absent. The expiry is advisory: nothing in this crate
//! deletes blobs or refuses to read them once it has passed.

use chrono::{DateTime, Datelike, NaiveDateTime, SubsecRound, TimeDelta, Utc};

use super::error::AttachmentError;
use crate::message::{Message, TimeToLive};
use crate::storage::{BlobAttributes, BlobRef, StorageError};

/// Metadata key holding the original message id.
pub const MESSAGE_ID_KEY: &str = "_MessageId";

/// Metadata key holding the expiry timestamp.
pub const VALID_UNTIL_UTC_KEY: &str = "_ValidUntilUtc";

/// Fixed-width, sortable, microsecond-precision UTC format.
pub const VALID_UNTIL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f Z";

/// Last year representable in [`VALID_UNTIL_FORMAT`].
const MAX_VALID_UNTIL_YEAR: i32 = 9999;

/// Format an expiry timestamp for `_ValidUntilUtc`.
#[must_use]
pub fn format_valid_until(at: DateTime<Utc>) -> String {
    at.format(VALID_UNTIL_FORMAT).to_string()
}

/// Parse a `_ValidUntilUtc` value.
///
/// # Errors
///
/// Returns the chrono parse error when `value` is not in
/// [`VALID_UNTIL_FORMAT`].
pub fn parse_valid_until(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, VALID_UNTIL_FORMAT).map(|naive| naive.and_utc())
}

/// Decoded attachment metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttachmentMetadata {
    /// Id of the message the body was taken from.
    pub message_id: Option<String>,
    /// When the message stops being deliverable, truncated to microseconds.
    pub valid_until: Option<DateTime<Utc>>,
}

impl AttachmentMetadata {
    /// Metadata for offloading `message` at `now`.
    ///
    /// Blank message ids are dropped; an infinite TTL yields no expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidTimeToLive`] when `now + ttl`
    /// overflows or lands past year 9999, where the expiry would no longer fit
    /// the four-digit year of [`VALID_UNTIL_FORMAT`].
    pub fn for_message(message: &Message, now: DateTime<Utc>) -> Result<Self, AttachmentError> {
        let message_id = message
            .message_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string);

        let valid_until = match message.time_to_live {
            TimeToLive::Infinite => None,
            TimeToLive::Finite(ttl) => {
                let expiry = TimeDelta::from_std(ttl)
                    .ok()
                    .and_then(|delta| now.checked_add_signed(delta))
                    .filter(|expiry| expiry.year() <= MAX_VALID_UNTIL_YEAR)
                    .ok_or(AttachmentError::InvalidTimeToLive(ttl))?;
                Some(expiry.trunc_subsecs(6))
            }
        };

        Ok(Self {
            message_id,
            valid_until,
        })
    }

    /// Write the entries onto a blob handle prior to upload.
    pub fn apply_to(&self, blob: &mut BlobRef) {
        if let Some(message_id) = &self.message_id {
            blob.set_metadata(MESSAGE_ID_KEY, message_id.clone());
        }
        if let Some(valid_until) = self.valid_until {
            blob.set_metadata(VALID_UNTIL_UTC_KEY, format_valid_until(valid_until));
        }
    }

    /// Decode the entries from stored blob attributes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidMetadata`] for an unparseable expiry.
    pub fn from_attributes(blob: &BlobRef, attributes: &BlobAttributes) -> Result<Self, StorageError> {
        let valid_until = attributes
            .metadata_value(VALID_UNTIL_UTC_KEY)
            .map(|value| {
                parse_valid_until(value).map_err(|e| {
                    StorageError::invalid_metadata(blob.path(), VALID_UNTIL_UTC_KEY, e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            message_id: attributes.metadata_value(MESSAGE_ID_KEY).map(str::to_string),
            valid_until,
        })
    }

    /// Whether the expiry has passed at `now`. Blobs without one never expire.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|valid_until| valid_until <= now)
    }
}
