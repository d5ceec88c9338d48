//! A schemaless document store front.
//!
//! Clients create collections ("types" within "domains"), then create,
//! replace, patch, fetch and delete JSON documents in them. Every mutation
//! classifies itself as `created`, `none`, `inserted`, `updated` or
//! `deleted`, and only real mutations publish a notification on
//! `store.<domain>.<type>.<id>.<action>`.
//!
//! The same operations are served by three bindings (HTTP, broker RPC and
//! pub/sub) over one [`Store`].

pub mod binding;
pub mod bus;
pub mod config;
pub mod document;
mod error;
pub mod logging;
pub mod storage;
pub mod store;

pub use bus::{ChannelError, InMemoryChannel, Message, MessageChannel};
pub use config::{ConfigError, StoreConfig};
pub use document::{Document, Patch, PatchError};
pub use error::StoreError;
pub use storage::{InMemoryStorage, StorageError, StorageProvider};
pub use store::{Action, Command, DocumentStore, ObjectOutcome, Reply, Store, TypeOutcome, Verb};

#[cfg(feature = "emitter")]
pub use bus::EmitterChannel;
