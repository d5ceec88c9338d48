//! Ordered deep-merge / deep-delete patches.
//!
//! ```json
//! { "items": [
//!     { "action": "update", "patch": { "b": { "y": 2 } } },
//!     { "action": "delete", "patch": { "b": { "x": null }, "c": null } }
//! ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a patch was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// `items` was missing or empty.
    #[error("Patch contains no items")]
    NoItems,
    /// The payload did not have the patch shape.
    #[error("malformed patch: {0}")]
    Malformed(String),
}

/// What a patch item does to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchAction {
    /// Deep-merge the partial document into the target.
    Update,
    /// Remove the keys named by the partial document.
    Delete,
}

/// One step of a [`Patch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchItem {
    pub action: PatchAction,
    pub patch: Map<String, Value>,
}

/// An ordered sequence of patch items, applied to a working copy in turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    #[serde(default)]
    pub items: Vec<PatchItem>,
}

impl Patch {
    /// Start an empty patch. Add items before using it; an empty patch is invalid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an `update` item.
    pub fn update(self, partial: Value) -> Result<Self, PatchError> {
        self.push(PatchAction::Update, partial)
    }

    /// Append a `delete` item.
    pub fn delete(self, partial: Value) -> Result<Self, PatchError> {
        self.push(PatchAction::Delete, partial)
    }

    fn push(mut self, action: PatchAction, partial: Value) -> Result<Self, PatchError> {
        let Value::Object(patch) = partial else {
            return Err(PatchError::Malformed(
                "patch item must be an object".to_string(),
            ));
        };
        self.items.push(PatchItem { action, patch });
        Ok(self)
    }

    /// Decode and validate a patch payload.
    pub fn from_value(value: Value) -> Result<Self, PatchError> {
        let patch: Patch =
            serde_json::from_value(value).map_err(|e| PatchError::Malformed(e.to_string()))?;
        patch.validate()?;
        Ok(patch)
    }

    /// A patch must carry at least one item.
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.items.is_empty() {
            return Err(PatchError::NoItems);
        }
        Ok(())
    }

    /// The wire form, as published in `updated` notifications.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "items": self.items })
    }

    /// Apply every item in order to a copy of `target`.
    pub fn apply(&self, target: &Map<String, Value>) -> Map<String, Value> {
        let mut working = target.clone();
        for item in &self.items {
            match item.action {
                PatchAction::Update => merge(&mut working, &item.patch),
                PatchAction::Delete => remove(&mut working, &item.patch),
            }
        }
        working
    }
}

/// Nested objects merge recursively; any other incoming value replaces the
/// target value wholesale (arrays included).
fn merge(target: &mut Map<String, Value>, partial: &Map<String, Value>) {
    for (key, incoming) in partial {
        if let (Some(Value::Object(existing)), Value::Object(nested)) =
            (target.get_mut(key), incoming)
        {
            merge(existing, nested);
            continue;
        }
        target.insert(key.clone(), incoming.clone());
    }
}

/// An object marker recurses into the matching nested object; any other
/// marker (normally `null`) removes the key.
fn remove(target: &mut Map<String, Value>, markers: &Map<String, Value>) {
    for (key, marker) in markers {
        match marker {
            Value::Object(nested) => {
                if let Some(Value::Object(existing)) = target.get_mut(key) {
                    remove(existing, nested);
                }
            }
            _ => {
                target.remove(key);
            }
        }
    }
}
