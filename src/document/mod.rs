//! Schemaless documents and the algorithms that compare and patch them.
//!
//! A document is a JSON object. Values are [`serde_json::Value`], which is
//! already the tagged union (object | array | scalar) the diff, merge and
//! delete algorithms recurse over.

pub mod diff;
pub mod patch;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use diff::{diff, equal};
pub use patch::{Patch, PatchAction, PatchError, PatchItem};

/// Field holding a document's identity.
pub const ID_FIELD: &str = "id";

/// Canonical (string) form of an id value. Strings and numbers are ids;
/// anything else counts as absent.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A schemaless record: a mapping from field name to nested JSON value.
///
/// Passed by value between the store and its storage provider; nothing
/// holds a reference into a stored document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a document from a JSON value. Fails unless the value is an object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// The document's id in canonical string form, if it has one.
    pub fn id(&self) -> Option<String> {
        self.0.get(ID_FIELD).and_then(id_from_value)
    }

    /// Set the id field (always written as a string).
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.0.insert(ID_FIELD.to_string(), Value::String(id.into()));
    }

    /// Builder form of [`set_id`](Self::set_id).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_id(id);
        self
    }

    /// Drop the id field, leaving storage to assign one.
    pub fn without_id(mut self) -> Self {
        self.0.remove(ID_FIELD);
        self
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Structural equality: same keys at every level, equal leaves, key
    /// order ignored, array order significant.
    pub fn is_equal(&self, other: &Document) -> bool {
        equal(&self.0, &other.0)
    }

    /// Apply a patch to a copy of this document. The id never changes.
    pub fn patched(&self, patch: &Patch) -> Document {
        let mut fields = patch.apply(&self.0);
        match self.0.get(ID_FIELD) {
            Some(id) => {
                fields.insert(ID_FIELD.to_string(), id.clone());
            }
            None => {
                fields.remove(ID_FIELD);
            }
        }
        Document(fields)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Document(fields)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        document.into_value()
    }
}
