//! In-process notification listeners layered over any channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use event_emitter_rs::EventEmitter;

use super::{ChannelError, MessageChannel, RpcInbox, Subscription};

/// Wraps a [`MessageChannel`] and re-emits every published payload to
/// in-process listeners registered on the exact topic.
///
/// Listeners receive the payload as a string (JSON for store notifications)
/// and run on the emitter's own threads, after the inner publish succeeded.
///
/// ## Example
///
/// ```ignore
/// let channel = EmitterChannel::new(InMemoryChannel::new());
/// channel.on("store.test.tbl.123.deleted", |payload| {
///     println!("deleted: {}", payload);
/// });
/// let store = Store::new(storage, channel);
/// ```
#[derive(Clone)]
pub struct EmitterChannel<C> {
    inner: C,
    emitter: Arc<Mutex<EventEmitter>>,
}

impl<C: MessageChannel> EmitterChannel<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            emitter: Arc::new(Mutex::new(EventEmitter::new())),
        }
    }

    /// Register a listener for one exact topic.
    pub fn on<F>(&self, topic: &str, listener: F) -> Result<(), ChannelError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.emitter
            .lock()
            .map_err(|_| ChannelError::LockPoisoned("emitter register"))?
            .on(topic, listener);
        Ok(())
    }

    /// Get a reference to the wrapped channel.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: MessageChannel> MessageChannel for EmitterChannel<C> {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ChannelError> {
        let text = String::from_utf8_lossy(&payload).into_owned();
        self.inner.publish(topic, payload).await?;
        self.emitter
            .lock()
            .map_err(|_| ChannelError::LockPoisoned("emit"))?
            .emit(topic, text);
        Ok(())
    }

    async fn subscribe(
        &self,
        pattern: &str,
        queue: &str,
    ) -> Result<Box<dyn Subscription>, ChannelError> {
        self.inner.subscribe(pattern, queue).await
    }

    async fn rpc_accept(&self, service: &str) -> Result<Box<dyn RpcInbox>, ChannelError> {
        self.inner.rpc_accept(service).await
    }

    async fn rpc_request(
        &self,
        service: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, ChannelError> {
        self.inner.rpc_request(service, payload, timeout).await
    }
}
