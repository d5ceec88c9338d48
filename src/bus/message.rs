//! Messages carried by a [`MessageChannel`](super::MessageChannel).

use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::ChannelError;

/// A message delivered over a topic or an RPC service.
#[derive(Clone, Debug)]
pub struct Message {
    /// Unique identifier, used for ack/nack.
    pub id: String,
    /// Dot-separated routing key (e.g. `"store.test.tbl.123.deleted"`).
    pub topic: String,
    /// Serialized payload, JSON for everything this crate publishes.
    pub payload: Vec<u8>,
}

impl Message {
    /// Create a message with an explicit id.
    pub fn new(id: impl Into<String>, topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            payload,
        }
    }

    /// Create a message with a freshly generated id.
    pub fn with_generated_id(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self::new(Uuid::new_v4().to_string(), topic, payload)
    }

    /// Decode the payload from JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ChannelError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Get the payload as a string (if valid UTF-8).
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
