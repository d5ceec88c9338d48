//! Change notifications emitted after real mutations.
//!
//! Topics live under the `store.` prefix:
//!
//! - `store.<domain>.<type>.<id>.<action>` for document mutations
//! - `store.<domain>.<type>.type.created` for collection creation
//!
//! Commands consumed by the PubSub binding end in `.store` instead, so the
//! two namespaces never overlap.

use serde_json::{json, Value};

use super::Action;
use crate::bus::ChannelError;

/// First segment of every notification topic.
pub const TOPIC_PREFIX: &str = "store";

/// A topic-addressed event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub topic: String,
    pub payload: Value,
}

impl Notification {
    /// Notification for a document mutation.
    pub fn object(domain: &str, type_name: &str, id: &str, action: Action, payload: Value) -> Self {
        Self {
            topic: format!("{TOPIC_PREFIX}.{domain}.{type_name}.{id}.{action}"),
            payload,
        }
    }

    /// Notification for a newly created collection.
    pub fn type_created(domain: &str, type_name: &str) -> Self {
        Self {
            topic: format!("{TOPIC_PREFIX}.{domain}.{type_name}.type.{}", Action::Created),
            payload: json!({ "domain": domain, "type": type_name }),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ChannelError> {
        Ok(serde_json::to_vec(&self.payload)?)
    }
}
