//! Core message channel traits.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{ChannelError, Message};

/// Broker abstraction consumed by the store and its bindings.
///
/// Covers the three primitives the store needs from a message broker:
/// topic publish, topic-pattern subscribe into a named queue, and
/// synchronous request/reply.
///
/// Implementations might include:
/// - `InMemoryChannel` - For testing and single-process scenarios
/// - an AMQP topic exchange with one queue per subscription name
#[async_trait]
pub trait MessageChannel: Send + Sync + 'static {
    /// Publish a payload on a topic.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ChannelError>;

    /// Bind `pattern` to the named queue and start consuming from it.
    ///
    /// Subscriptions that share a queue name compete for its messages.
    async fn subscribe(
        &self,
        pattern: &str,
        queue: &str,
    ) -> Result<Box<dyn Subscription>, ChannelError>;

    /// Start accepting requests addressed to `service`.
    async fn rpc_accept(&self, service: &str) -> Result<Box<dyn RpcInbox>, ChannelError>;

    /// Send a request to `service` and wait for its reply.
    async fn rpc_request(
        &self,
        service: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, ChannelError>;
}

/// A pull-based consumer of one queue.
#[async_trait]
pub trait Subscription: Send + Sync {
    /// Wait for the next message, up to `timeout`.
    async fn poll(&self, timeout: Duration) -> Result<Option<Message>, ChannelError>;

    /// Acknowledge that a message has been processed.
    async fn ack(&self, message_id: &str) -> Result<(), ChannelError>;

    /// Reject a message; the channel may redeliver it.
    async fn nack(&self, message_id: &str, reason: &str) -> Result<(), ChannelError>;
}

/// Incoming side of a request/reply service.
#[async_trait]
pub trait RpcInbox: Send + Sync {
    /// Wait for the next request, up to `timeout`.
    async fn next(&self, timeout: Duration) -> Result<Option<RpcCall>, ChannelError>;
}

/// One in-flight request and the handle used to answer it.
#[derive(Debug)]
pub struct RpcCall {
    /// The request message.
    pub request: Message,
    reply_to: oneshot::Sender<Vec<u8>>,
}

impl RpcCall {
    pub fn new(request: Message, reply_to: oneshot::Sender<Vec<u8>>) -> Self {
        Self { request, reply_to }
    }

    /// Send the reply. Fails with `Closed` if the caller stopped waiting.
    pub fn reply(self, payload: Vec<u8>) -> Result<(), ChannelError> {
        self.reply_to.send(payload).map_err(|_| ChannelError::Closed)
    }
}
