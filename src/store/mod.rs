//! Store core - the operation set, action classification and notifications.
//!
//! Every binding calls into a [`DocumentStore`]. [`Store`] is the
//! implementation over a [`StorageProvider`](crate::storage::StorageProvider)
//! and a [`MessageChannel`](crate::bus::MessageChannel):
//!
//! ```text
//! binding ─▶ Store ─▶ StorageProvider (get / put / remove)
//!              │
//!              └────▶ MessageChannel (publish, only when action != none)
//! ```

mod action;
mod command;
mod engine;
mod notification;

pub use action::{Action, ObjectOutcome, TypeOutcome};
pub use command::{Command, DocumentStore, Reply, Verb};
pub use engine::Store;
pub use notification::{Notification, TOPIC_PREFIX};
