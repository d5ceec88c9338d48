//! PubSub binding - store commands published as topic messages.
//!
//! Command topics have the form `<prefix>.<domain>.<type>[.<id>].<verb>.store`.
//! Each verb is consumed through its own named queue, so several store
//! instances share the work. Notifications emitted by the store live under
//! `store.` and end in an action, never in `.store`, so the binding never
//! consumes its own output.
//!
//! Every message is acknowledged whether or not the command succeeded;
//! failures are only logged.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::transport::{StopSignal, TransportHandle, TransportStats};
use super::{decode_command, BindingError};
use crate::bus::{ChannelError, Message, MessageChannel, Subscription};
use crate::store::{DocumentStore, Reply, Verb};

/// One command subscription: the verb it carries, its topic pattern and
/// the queue it is consumed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSubscription {
    pub verb: Verb,
    pub pattern: &'static str,
    pub queue: &'static str,
}

pub const SUBSCRIPTIONS: [CommandSubscription; 5] = [
    CommandSubscription {
        verb: Verb::Create,
        pattern: "*.*.*.create.store",
        queue: "store_put_type",
    },
    CommandSubscription {
        verb: Verb::Post,
        pattern: "*.*.*.post.store",
        queue: "store_post",
    },
    CommandSubscription {
        verb: Verb::Put,
        pattern: "*.*.*.*.put.store",
        queue: "store_put",
    },
    CommandSubscription {
        verb: Verb::Patch,
        pattern: "*.*.*.*.patch.store",
        queue: "store_patch",
    },
    CommandSubscription {
        verb: Verb::Delete,
        pattern: "*.*.*.*.delete.store",
        queue: "store_delete",
    },
];

/// Where a command topic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTarget {
    pub domain: String,
    pub type_name: String,
    pub id: Option<String>,
}

/// Split a command topic into domain, type and (for document verbs) id.
pub fn decode_topic(verb: Verb, topic: &str) -> Result<CommandTarget, BindingError> {
    let segments: Vec<&str> = topic.split('.').collect();
    let with_id = !matches!(verb, Verb::Create | Verb::Post);
    let expected = if with_id { 6 } else { 5 };

    if segments.len() != expected || segments[expected - 2] != verb.as_str() {
        return Err(BindingError::Decode(format!(
            "topic {topic} is not a {verb} command"
        )));
    }

    Ok(CommandTarget {
        domain: segments[1].to_string(),
        type_name: segments[2].to_string(),
        id: with_id.then(|| segments[3].to_string()),
    })
}

/// Topic a client publishes a command on.
pub fn command_topic(
    prefix: &str,
    verb: Verb,
    domain: &str,
    type_name: &str,
    id: Option<&str>,
) -> String {
    match id {
        Some(id) => format!("{prefix}.{domain}.{type_name}.{id}.{verb}.store"),
        None => format!("{prefix}.{domain}.{type_name}.{verb}.store"),
    }
}

/// Translates command messages into store commands.
pub struct PubSubBinding<D> {
    store: Arc<D>,
}

impl<D: DocumentStore> PubSubBinding<D> {
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }

    /// Run the command carried by `message`. An empty payload is no body.
    pub async fn handle(&self, verb: Verb, message: &Message) -> Result<Reply, BindingError> {
        let target = decode_topic(verb, &message.topic)?;
        let body = if message.payload.is_empty() {
            None
        } else {
            Some(
                serde_json::from_slice::<Value>(&message.payload)
                    .map_err(|e| BindingError::Decode(format!("invalid body: {e}")))?,
            )
        };

        let command = decode_command(verb, &target.domain, &target.type_name, target.id, body)?;
        Ok(self.store.dispatch(command).await?)
    }
}

/// Subscribe to every command pattern and process messages in the
/// background until the returned handle is stopped.
pub async fn subscribe<D, C>(
    store: Arc<D>,
    channel: &C,
    poll_interval: Duration,
) -> Result<TransportHandle, ChannelError>
where
    D: DocumentStore,
    C: MessageChannel + ?Sized,
{
    let binding = Arc::new(PubSubBinding::new(store));
    let (mut handle, stop) = TransportHandle::new();

    for entry in SUBSCRIPTIONS {
        let subscription: Arc<dyn Subscription> =
            Arc::from(channel.subscribe(entry.pattern, entry.queue).await?);
        handle.spawn(consume(
            Arc::clone(&binding),
            subscription,
            entry,
            stop.clone(),
            poll_interval,
        ));
        debug!(pattern = entry.pattern, queue = entry.queue, "pubsub binding subscribed");
    }

    Ok(handle)
}

async fn consume<D: DocumentStore>(
    binding: Arc<PubSubBinding<D>>,
    subscription: Arc<dyn Subscription>,
    entry: CommandSubscription,
    mut stop: StopSignal,
    poll_interval: Duration,
) -> TransportStats {
    let mut stats = TransportStats::default();
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = stop.stopped() => break,
            next = subscription.poll(poll_interval) => {
                stats.polls += 1;
                match next {
                    Ok(Some(message)) => {
                        let binding = Arc::clone(&binding);
                        let subscription = Arc::clone(&subscription);
                        in_flight.spawn(async move {
                            process(&binding, subscription.as_ref(), entry, message).await
                        });
                    }
                    Ok(None) => {}
                    Err(ChannelError::Closed) => break,
                    Err(e) => warn!(queue = entry.queue, error = %e, "pubsub poll failed"),
                }
            }
            Some(done) = in_flight.join_next() => record(&mut stats, done),
        }
    }

    while let Some(done) = in_flight.join_next().await {
        record(&mut stats, done);
    }
    stats
}

async fn process<D: DocumentStore>(
    binding: &PubSubBinding<D>,
    subscription: &dyn Subscription,
    entry: CommandSubscription,
    message: Message,
) -> bool {
    let ok = match binding.handle(entry.verb, &message).await {
        Ok(_) => true,
        Err(e) => {
            warn!(
                topic = %message.topic,
                queue = entry.queue,
                error = %e,
                "pubsub command failed"
            );
            false
        }
    };

    if let Err(e) = subscription.ack(&message.id).await {
        warn!(topic = %message.topic, queue = entry.queue, error = %e, "ack failed");
    }
    ok
}

fn record(stats: &mut TransportStats, done: Result<bool, tokio::task::JoinError>) {
    match done {
        Ok(true) => stats.handled += 1,
        Ok(false) => stats.failed += 1,
        Err(e) => {
            warn!(error = %e, "pubsub handler task failed");
            stats.failed += 1;
        }
    }
}
