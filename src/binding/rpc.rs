//! RPC binding - structured request/reply over a message channel service.
//!
//! ## Wire shapes
//!
//! ```json
//! { "method": "put", "domain": "test", "type": "tbl", "id": 123, "object": { "a": 1 } }
//! ```
//!
//! Replies are `{ "data": ... }` on success and `{ "error": { "message": ... } }`
//! on failure. Every error, including an undecodable request, becomes an
//! error reply; nothing escapes the binding.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::transport::{StopSignal, TransportHandle, TransportStats};
use super::{decode_command, BindingError};
use crate::bus::{ChannelError, MessageChannel, RpcCall, RpcInbox};
use crate::document::id_from_value;
use crate::store::{DocumentStore, Reply, Verb};

/// Service name the binding accepts on unless configured otherwise.
pub const DEFAULT_SERVICE: &str = "store_rpc";

/// A store request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: Verb,
    pub domain: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Document id, a string or a number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Document for `post`/`put`, patch for `patch`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
}

impl RpcRequest {
    pub fn new(method: Verb, domain: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            method,
            domain: domain.into(),
            type_name: type_name.into(),
            id: None,
            object: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_object(mut self, object: Value) -> Self {
        self.object = Some(object);
        self
    }
}

/// Message of an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// A store reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcReply {
    Data { data: Value },
    Error { error: ErrorBody },
}

impl RpcReply {
    pub fn data(data: Value) -> Self {
        RpcReply::Data { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        RpcReply::Error {
            error: ErrorBody {
                message: message.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RpcReply::Error { .. })
    }

    pub fn into_result(self) -> Result<Value, String> {
        match self {
            RpcReply::Data { data } => Ok(data),
            RpcReply::Error { error } => Err(error.message),
        }
    }
}

/// Translates [`RpcRequest`]s into store commands.
pub struct RpcBinding<D> {
    store: Arc<D>,
}

impl<D: DocumentStore> RpcBinding<D> {
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }

    /// Decode and run a request, keeping the typed error.
    pub async fn execute(&self, request: RpcRequest) -> Result<Reply, BindingError> {
        let id = match request.id {
            None | Some(Value::Null) => None,
            Some(value) => Some(id_from_value(&value).ok_or_else(|| {
                BindingError::Decode("id must be a string or a number".to_string())
            })?),
        };
        let command = decode_command(
            request.method,
            &request.domain,
            &request.type_name,
            id,
            request.object,
        )?;
        Ok(self.store.dispatch(command).await?)
    }

    /// Run a request and render the reply.
    pub async fn handle(&self, request: RpcRequest) -> RpcReply {
        let method = request.method;
        let domain = request.domain.clone();
        match self.execute(request).await {
            Ok(reply) => RpcReply::data(reply.to_value()),
            Err(e) => {
                warn!(method = %method, domain = %domain, error = %e, "rpc request failed");
                RpcReply::error(e.to_string())
            }
        }
    }

    /// Decode raw request bytes and run them.
    pub async fn handle_bytes(&self, payload: &[u8]) -> RpcReply {
        match decode_request(payload) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "undecodable rpc request");
                RpcReply::error(e.to_string())
            }
        }
    }

    async fn answer(&self, call: RpcCall) -> bool {
        let reply = self.handle_bytes(&call.request.payload).await;
        let ok = !reply.is_error();
        let bytes = match serde_json::to_vec(&reply) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "rpc reply encoding failed");
                return false;
            }
        };
        if let Err(e) = call.reply(bytes) {
            debug!(error = %e, "rpc caller went away before the reply");
        }
        ok
    }
}

/// Decode request bytes. Unknown methods are reported by name.
pub fn decode_request(payload: &[u8]) -> Result<RpcRequest, BindingError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| BindingError::Decode(format!("invalid request: {e}")))?;

    if let Some(method) = value.get("method").and_then(Value::as_str) {
        if serde_json::from_value::<Verb>(Value::String(method.to_string())).is_err() {
            return Err(BindingError::Decode(format!("unknown method: {method}")));
        }
    }

    serde_json::from_value(value).map_err(|e| BindingError::Decode(format!("invalid request: {e}")))
}

/// Accept requests for `service` on the channel and answer them in the
/// background until the returned handle is stopped.
///
/// Requests are answered concurrently.
pub async fn accept<D, C>(
    store: Arc<D>,
    channel: &C,
    service: &str,
    poll_interval: Duration,
) -> Result<TransportHandle, ChannelError>
where
    D: DocumentStore,
    C: MessageChannel + ?Sized,
{
    let inbox = channel.rpc_accept(service).await?;
    let binding = Arc::new(RpcBinding::new(store));
    let (mut handle, stop) = TransportHandle::new();
    handle.spawn(serve(binding, inbox, stop, poll_interval, service.to_string()));
    debug!(service, "rpc binding accepting");
    Ok(handle)
}

async fn serve<D: DocumentStore>(
    binding: Arc<RpcBinding<D>>,
    inbox: Box<dyn RpcInbox>,
    mut stop: StopSignal,
    poll_interval: Duration,
    service: String,
) -> TransportStats {
    let mut stats = TransportStats::default();
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = stop.stopped() => break,
            next = inbox.next(poll_interval) => {
                stats.polls += 1;
                match next {
                    Ok(Some(call)) => {
                        let binding = Arc::clone(&binding);
                        in_flight.spawn(async move { binding.answer(call).await });
                    }
                    Ok(None) => {}
                    Err(ChannelError::Closed) => break,
                    Err(e) => warn!(service = %service, error = %e, "rpc inbox failed"),
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

fn record(stats: &mut TransportStats, done: Result<bool, tokio::task::JoinError>) {
    match done {
        Ok(true) => stats.handled += 1,
        Ok(false) => stats.failed += 1,
        Err(e) => {
            warn!(error = %e, "rpc handler task failed");
            stats.failed += 1;
        }
    }
}

/// Client side: send a request to `service` and decode the reply.
pub async fn call<C>(
    channel: &C,
    service: &str,
    request: &RpcRequest,
    timeout: Duration,
) -> Result<RpcReply, ChannelError>
where
    C: MessageChannel + ?Sized,
{
    let payload = serde_json::to_vec(request)?;
    let reply = channel.rpc_request(service, payload, timeout).await?;
    Ok(serde_json::from_slice(&reply)?)
}
