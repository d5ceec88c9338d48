use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome classifier returned by every mutating store operation.
///
/// Computed by the store, never supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// A collection was created.
    Created,
    /// Nothing changed.
    None,
    /// A document was written for the first time.
    Inserted,
    /// An existing document was replaced or patched.
    Updated,
    /// A document was removed.
    Deleted,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::None => "none",
            Action::Inserted => "inserted",
            Action::Updated => "updated",
            Action::Deleted => "deleted",
        }
    }

    /// Whether this outcome changed anything (and so was notified).
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Action::None)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `create_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOutcome {
    pub action: Action,
}

/// Result of a document mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectOutcome {
    pub id: String,
    pub action: Action,
}

impl ObjectOutcome {
    pub fn new(id: impl Into<String>, action: Action) -> Self {
        Self {
            id: id.into(),
            action,
        }
    }
}
