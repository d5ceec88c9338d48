//! Message bus - broker abstractions consumed by the store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      MessageChannel                          │
//! │  publish(topic) / subscribe(pattern, queue) / rpc_accept()   │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                      │
//!          ▼                    ▼                      ▼
//! ┌────────────────┐  ┌──────────────────┐  ┌────────────────────┐
//! │ Subscription   │  │    RpcInbox      │  │  publish (events)  │
//! │ poll/ack/nack  │  │ next -> RpcCall  │  │  store.<d>.<t>...  │
//! └────────────────┘  └──────────────────┘  └────────────────────┘
//!          │                    │
//!          ▼                    ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ InMemoryChannel (included)  │  AMQP topic exchange (external)│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands reach the store on `<prefix>.<domain>.<type>[.<id>].<verb>.store`
//! topics; the store answers with events on `store.<domain>.<type>...`.

mod channel;
#[cfg(feature = "emitter")]
mod emitter;
mod error;
mod in_memory;
mod message;
pub mod topic;

pub use channel::{MessageChannel, RpcCall, RpcInbox, Subscription};
#[cfg(feature = "emitter")]
pub use emitter::EmitterChannel;
pub use error::ChannelError;
pub use in_memory::{InMemoryChannel, InMemoryInbox, InMemorySubscription};
pub use message::Message;
