//! In-memory message channel for testing and single-process scenarios.
//!
//! This module provides a thread-safe in-memory channel that implements
//! [`MessageChannel`], useful for:
//! - Unit and integration testing without a broker
//! - Single-process deployments
//! - Development and prototyping

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex, Notify};
use tokio::time::Instant;

use super::{topic, ChannelError, Message, MessageChannel, RpcCall, RpcInbox, Subscription};

/// In-memory message channel.
///
/// Features:
/// - Cheap to clone; clones share the same broker state
/// - Optional log of everything published and acknowledged, for inspection
///   (see [`InMemoryChannel::recording`])
/// - Named queues bound to topic patterns; subscriptions on the same queue
///   compete, different queues each get a copy
/// - `nack` puts the message back at the head of its queue
/// - RPC services with one-shot replies; a service is registered while at
///   least one of its inboxes is alive
///
/// ## Example
///
/// ```
/// # tokio_test_block(async {
/// use std::time::Duration;
/// use glued_store::bus::{InMemoryChannel, MessageChannel};
///
/// let channel = InMemoryChannel::new();
/// let subscription = channel.subscribe("store.#", "audit").await.unwrap();
///
/// channel.publish("store.test.tbl.1.inserted", b"{}".to_vec()).await.unwrap();
///
/// let message = subscription.poll(Duration::from_millis(100)).await.unwrap().unwrap();
/// assert_eq!(message.topic, "store.test.tbl.1.inserted");
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryChannel {
    recording: bool,
    log: Arc<RwLock<Vec<Message>>>,
    queues: Arc<Mutex<HashMap<String, Arc<Queue>>>>,
    services: Services,
}

#[derive(Default)]
struct Queue {
    recording: bool,
    state: Mutex<QueueState>,
    notify: Notify,
}

#[derive(Default)]
struct QueueState {
    patterns: Vec<String>,
    pending: VecDeque<Message>,
    in_flight: HashMap<String, Message>,
    acked: Vec<String>,
}

struct Service {
    sender: mpsc::UnboundedSender<RpcCall>,
    receiver: Arc<AsyncMutex<mpsc::UnboundedReceiver<RpcCall>>>,
    inboxes: usize,
}

type Services = Arc<Mutex<HashMap<String, Service>>>;

impl Queue {
    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, QueueState>, ChannelError> {
        self.state
            .lock()
            .map_err(|_| ChannelError::LockPoisoned(operation))
    }

    fn routes(&self, topic_name: &str) -> Result<bool, ChannelError> {
        let state = self.lock("route")?;
        Ok(state
            .patterns
            .iter()
            .any(|pattern| topic::matches(pattern, topic_name)))
    }

    fn deliver(&self, message: Message) -> Result<(), ChannelError> {
        self.lock("deliver")?.pending.push_back(message);
        self.notify.notify_one();
        Ok(())
    }

    fn take_next(&self) -> Result<Option<Message>, ChannelError> {
        let mut state = self.lock("poll")?;
        let Some(message) = state.pending.pop_front() else {
            return Ok(None);
        };
        state.in_flight.insert(message.id.clone(), message.clone());
        Ok(Some(message))
    }
}

impl InMemoryChannel {
    /// Create a new in-memory channel.
    ///
    /// Nothing is retained once it has been delivered and acknowledged, so the
    /// inspection helpers below report an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel that keeps every published message and every
    /// acknowledged id, for tests that inspect what went over the wire.
    pub fn recording() -> Self {
        Self {
            recording: true,
            ..Self::default()
        }
    }

    fn queue(&self, name: &str) -> Result<Arc<Queue>, ChannelError> {
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| ChannelError::LockPoisoned("queue lookup"))?;
        let queue = queues.entry(name.to_string()).or_insert_with(|| {
            Arc::new(Queue {
                recording: self.recording,
                ..Queue::default()
            })
        });
        Ok(Arc::clone(queue))
    }

    /// Get every message published so far. Empty unless recording.
    pub fn published(&self) -> Vec<Message> {
        self.log.read().map(|log| log.clone()).unwrap_or_default()
    }

    /// Get all published topics in order.
    pub fn topics(&self) -> Vec<String> {
        self.log
            .read()
            .map(|log| log.iter().map(|m| m.topic.clone()).collect())
            .unwrap_or_default()
    }

    /// Get the total number of published messages.
    pub fn len(&self) -> usize {
        self.log.read().map(|log| log.len()).unwrap_or_default()
    }

    /// Check if nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the first published message on an exact topic.
    pub fn find_by_topic(&self, topic_name: &str) -> Option<Message> {
        self.log
            .read()
            .ok()?
            .iter()
            .find(|m| m.topic == topic_name)
            .cloned()
    }

    /// Find all published messages on an exact topic.
    pub fn find_all_by_topic(&self, topic_name: &str) -> Vec<Message> {
        self.log
            .read()
            .map(|log| {
                log.iter()
                    .filter(|m| m.topic == topic_name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the ids of messages acknowledged on a queue. Empty unless recording.
    pub fn acknowledged(&self, queue: &str) -> Vec<String> {
        self.queue(queue)
            .ok()
            .and_then(|q| q.lock("inspect").ok().map(|state| state.acked.clone()))
            .unwrap_or_default()
    }

    /// Number of messages waiting on a queue (not yet polled).
    pub fn pending(&self, queue: &str) -> usize {
        self.queue(queue)
            .ok()
            .and_then(|q| q.lock("inspect").ok().map(|state| state.pending.len()))
            .unwrap_or_default()
    }

    /// Clear the publish log (useful for test cleanup). Queue bindings stay.
    pub fn clear(&self) {
        if let Ok(mut log) = self.log.write() {
            log.clear();
        }
    }
}

#[async_trait]
impl MessageChannel for InMemoryChannel {
    async fn publish(&self, topic_name: &str, payload: Vec<u8>) -> Result<(), ChannelError> {
        let message = Message::with_generated_id(topic_name, payload);

        if self.recording {
            self.log
                .write()
                .map_err(|_| ChannelError::LockPoisoned("publish"))?
                .push(message.clone());
        }

        let queues: Vec<Arc<Queue>> = self
            .queues
            .lock()
            .map_err(|_| ChannelError::LockPoisoned("publish"))?
            .values()
            .cloned()
            .collect();

        for queue in queues {
            if queue.routes(topic_name)? {
                queue.deliver(message.clone())?;
            }
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        pattern: &str,
        queue: &str,
    ) -> Result<Box<dyn Subscription>, ChannelError> {
        let bound = self.queue(queue)?;
        {
            let mut state = bound.lock("subscribe")?;
            if !state.patterns.iter().any(|p| p == pattern) {
                state.patterns.push(pattern.to_string());
            }
        }
        Ok(Box::new(InMemorySubscription { queue: bound }))
    }

    async fn rpc_accept(&self, service: &str) -> Result<Box<dyn RpcInbox>, ChannelError> {
        let mut services = self
            .services
            .lock()
            .map_err(|_| ChannelError::LockPoisoned("rpc accept"))?;
        let entry = services.entry(service.to_string()).or_insert_with(|| {
            let (sender, receiver) = mpsc::unbounded_channel();
            Service {
                sender,
                receiver: Arc::new(AsyncMutex::new(receiver)),
                inboxes: 0,
            }
        });
        entry.inboxes += 1;
        Ok(Box::new(InMemoryInbox {
            receiver: Arc::clone(&entry.receiver),
            services: Arc::clone(&self.services),
            service: service.to_string(),
        }))
    }

    async fn rpc_request(
        &self,
        service: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, ChannelError> {
        let sender = self
            .services
            .lock()
            .map_err(|_| ChannelError::LockPoisoned("rpc request"))?
            .get(service)
            .map(|s| s.sender.clone())
            .ok_or_else(|| ChannelError::NoResponder(service.to_string()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        sender
            .send(RpcCall::new(
                Message::with_generated_id(service, payload),
                reply_tx,
            ))
            .map_err(|_| ChannelError::NoResponder(service.to_string()))?;

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(ChannelError::Closed),
            Err(_) => Err(ChannelError::Timeout),
        }
    }
}

/// Consumer handle for one named queue of an [`InMemoryChannel`].
pub struct InMemorySubscription {
    queue: Arc<Queue>,
}

#[async_trait]
impl Subscription for InMemorySubscription {
    async fn poll(&self, timeout: Duration) -> Result<Option<Message>, ChannelError> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(message) = self.queue.take_next()? {
                return Ok(Some(message));
            }

            if tokio::time::timeout_at(deadline, self.queue.notify.notified())
                .await
                .is_err()
            {
                return self.queue.take_next();
            }
        }
    }

    async fn ack(&self, message_id: &str) -> Result<(), ChannelError> {
        let mut state = self.queue.lock("ack")?;
        if state.in_flight.remove(message_id).is_some() && self.queue.recording {
            state.acked.push(message_id.to_string());
        }
        Ok(())
    }

    async fn nack(&self, message_id: &str, reason: &str) -> Result<(), ChannelError> {
        {
            let mut state = self.queue.lock("nack")?;
            let Some(message) = state.in_flight.remove(message_id) else {
                return Ok(());
            };
            tracing::debug!(id = message_id, reason, "message requeued");
            state.pending.push_front(message);
        }
        self.queue.notify.notify_one();
        Ok(())
    }
}

/// Request side of an in-memory RPC service.
///
/// Dropping the last inbox of a service unregisters it. Calls still queued
/// for it are dropped, so their callers see [`ChannelError::Closed`].
pub struct InMemoryInbox {
    receiver: Arc<AsyncMutex<mpsc::UnboundedReceiver<RpcCall>>>,
    services: Services,
    service: String,
}

impl Drop for InMemoryInbox {
    fn drop(&mut self) {
        let Ok(mut services) = self.services.lock() else {
            return;
        };
        let Some(entry) = services.get_mut(&self.service) else {
            return;
        };
        entry.inboxes = entry.inboxes.saturating_sub(1);
        if entry.inboxes == 0 {
            services.remove(&self.service);
            tracing::debug!(service = %self.service, "rpc service unregistered");
        }
    }
}

#[async_trait]
impl RpcInbox for InMemoryInbox {
    async fn next(&self, timeout: Duration) -> Result<Option<RpcCall>, ChannelError> {
        let receive = async {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        };

        match tokio::time::timeout(timeout, receive).await {
            Ok(Some(call)) => Ok(Some(call)),
            Ok(None) => Err(ChannelError::Closed),
            Err(_) => Ok(None),
        }
    }
}
