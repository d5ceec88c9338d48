//! Error type for message channel operations.

use thiserror::Error;

/// Error returned by [`MessageChannel`](super::MessageChannel) and its
/// subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Encoding or decoding a payload failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
    /// The broker rejected the message.
    #[error("message rejected: {0}")]
    Rejected(String),
    /// No consumer is accepting requests for the named RPC service.
    #[error("no responder for service {0}")]
    NoResponder(String),
    /// Timed out waiting for a reply.
    #[error("request timed out")]
    Timeout,
    /// The other side of the channel went away.
    #[error("channel closed")]
    Closed,
    /// A lock guarding in-process channel state was poisoned.
    #[error("channel lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        ChannelError::SerializationFailed(err.to_string())
    }
}
