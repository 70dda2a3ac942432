//! Message envelope seen by the attachment hooks.
//!
//! The envelope is owned by the bus pipeline. The hooks only touch `body` and
//! `user_properties`, in place.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

/// How long a message stays deliverable on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeToLive {
    /// Never expires. Offloaded blobs get no `_ValidUntilUtc` entry.
    #[default]
    Infinite,
    /// Expires after the given duration.
    Finite(Duration),
}

impl TimeToLive {
    /// Returns the finite duration, if any.
    #[must_use]
    pub const fn as_duration(self) -> Option<Duration> {
        match self {
            Self::Infinite => None,
            Self::Finite(ttl) => Some(ttl),
        }
    }

    /// Whether this is the infinite sentinel.
    #[must_use]
    pub const fn is_infinite(self) -> bool {
        matches!(self, Self::Infinite)
    }
}

/// `Duration::MAX` is treated as the infinite sentinel.
impl From<Duration> for TimeToLive {
    fn from(ttl: Duration) -> Self {
        if ttl == Duration::MAX {
            Self::Infinite
        } else {
            Self::Finite(ttl)
        }
    }
}

/// A bus message as passed through the send and receive hooks.
#[derive(Clone, PartialEq, Default)]
pub struct Message {
    /// Payload bytes. Empty while the payload lives in blob storage.
    pub body: Bytes,
    /// Transport-assigned or application-assigned identifier.
    pub message_id: Option<String>,
    /// Time to live on the bus.
    pub time_to_live: TimeToLive,
    /// Application properties travelling with the message.
    pub user_properties: HashMap<String, Value>,
}

impl Message {
    /// Create a message with the given body and no id, infinite TTL.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Set the message id.
    #[must_use]
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Set the time to live.
    #[must_use]
    pub fn with_time_to_live(mut self, ttl: impl Into<TimeToLive>) -> Self {
        self.time_to_live = ttl.into();
        self
    }

    /// Set a user property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.user_properties.insert(key.into(), value.into());
        self
    }

    /// Look up a user property holding a string.
    #[must_use]
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.user_properties.get(key).and_then(Value::as_str)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("body_len", &self.body.len())
            .field("message_id", &self.message_id)
            .field("time_to_live", &self.time_to_live)
            .field("user_properties", &self.user_properties)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_duration_is_infinite() {
        assert_eq!(TimeToLive::from(Duration::MAX), TimeToLive::Infinite);
        assert_eq!(
            TimeToLive::from(Duration::from_secs(60)),
            TimeToLive::Finite(Duration::from_secs(60))
        );
        assert!(TimeToLive::default().is_infinite());
    }

    #[test]
    fn test_builder_sets_fields() {
        let message = Message::new(vec![1u8, 2, 3])
            .with_message_id("order-42")
            .with_time_to_live(Duration::from_secs(30))
            .with_property("tenant", "acme")
            .with_property("attempt", 2);

        assert_eq!(message.body.as_ref(), &[1, 2, 3]);
        assert_eq!(message.message_id.as_deref(), Some("order-42"));
        assert_eq!(
            message.time_to_live.as_duration(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(message.property_str("tenant"), Some("acme"));
        assert_eq!(message.property_str("attempt"), None);
    }

    #[test]
    fn test_debug_omits_body_bytes() {
        let message = Message::new(vec![0u8; 4096]);
        let rendered = format!("{message:?}");
        assert!(rendered.contains("body_len: 4096"));
        assert!(rendered.len() < 200);
    }
}
