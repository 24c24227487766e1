//! Inbound message type
//!
//! A message is an opaque payload plus the delivery metadata the queue keeps
//! for it. The payload is never modified after delivery: the exact bytes that
//! arrived are the bytes written to the capped list.

use std::time::SystemTime;

/// Delivery metadata maintained by the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Identifier assigned by the queue
    pub id: String,
    /// Number of times this message has been delivered, including the current one
    pub attempts: u16,
    /// Time the message first entered the queue
    pub timestamp: SystemTime,
}

/// A message received from the queue
///
/// # Example
///
/// ```rust
/// use caplist::queue::Message;
///
/// let message = Message::new("0000000000000001", br#"{"user_id":"u1"}"#.to_vec());
/// assert_eq!(message.id(), "0000000000000001");
/// assert_eq!(message.attempts(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub body: Vec<u8>,
}

impl Message {
    pub fn new(id: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            header: MessageHeader {
                id: id.into(),
                attempts: 0,
                timestamp: SystemTime::now(),
            },
            body,
        }
    }

    pub fn id(&self) -> &str {
        &self.header.id
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn attempts(&self) -> u16 {
        self.header.attempts
    }

    /// Record one more delivery of this message
    pub fn mark_delivered(&mut self) {
        self.header.attempts = self.header.attempts.saturating_add(1);
    }

    /// Payload as text for logging, with invalid UTF-8 replaced
    pub fn body_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
