//! The transport-agnostic operation set every binding translates into.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ObjectOutcome, TypeOutcome};
use crate::document::{Document, Patch};
use crate::error::StoreError;

/// Transport verb naming one store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Create a collection. `type` is accepted as a legacy alias.
    #[serde(alias = "type")]
    Create,
    Post,
    Put,
    Patch,
    Get,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Create,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
        Verb::Get,
        Verb::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Patch => "patch",
            Verb::Get => "get",
            Verb::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully decoded request, ready for [`DocumentStore::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateType {
        domain: String,
        type_name: String,
    },
    /// Store a document whose id comes from its body (or is assigned).
    Post {
        domain: String,
        type_name: String,
        document: Document,
    },
    /// Store a document under an explicit id.
    Put {
        domain: String,
        type_name: String,
        id: String,
        document: Document,
    },
    Patch {
        domain: String,
        type_name: String,
        id: String,
        patch: Patch,
    },
    Get {
        domain: String,
        type_name: String,
        id: String,
    },
    Delete {
        domain: String,
        type_name: String,
        id: String,
    },
}

impl Command {
    pub fn verb(&self) -> Verb {
        match self {
            Command::CreateType { .. } => Verb::Create,
            Command::Post { .. } => Verb::Post,
            Command::Put { .. } => Verb::Put,
            Command::Patch { .. } => Verb::Patch,
            Command::Get { .. } => Verb::Get,
            Command::Delete { .. } => Verb::Delete,
        }
    }
}

/// What a dispatched command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Type(TypeOutcome),
    Object(ObjectOutcome),
    Document(Document),
}

impl Reply {
    /// JSON form used as the `data` of RPC replies.
    pub fn to_value(&self) -> Value {
        match self {
            Reply::Type(outcome) => serde_json::json!({ "action": outcome.action }),
            Reply::Object(outcome) => {
                serde_json::json!({ "id": outcome.id, "action": outcome.action })
            }
            Reply::Document(document) => document.clone().into_value(),
        }
    }
}

/// The store operation set.
///
/// Bindings depend on this trait rather than on a concrete store so a
/// single translator can front any implementation.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Ensure a collection exists. `created` the first time, `none` after.
    async fn create_type(&self, domain: &str, type_name: &str) -> Result<TypeOutcome, StoreError>;

    /// Create or replace a document.
    async fn store_object(
        &self,
        domain: &str,
        type_name: &str,
        document: Document,
    ) -> Result<ObjectOutcome, StoreError>;

    /// Apply a patch to an existing document.
    async fn patch_object(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
        patch: &Patch,
    ) -> Result<ObjectOutcome, StoreError>;

    /// Fetch a document.
    async fn get_object(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
    ) -> Result<Document, StoreError>;

    /// Remove a document.
    async fn delete_object(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
    ) -> Result<ObjectOutcome, StoreError>;

    /// Run a decoded command against the matching operation.
    async fn dispatch(&self, command: Command) -> Result<Reply, StoreError> {
        match command {
            Command::CreateType { domain, type_name } => {
                self.create_type(&domain, &type_name).await.map(Reply::Type)
            }
            Command::Post {
                domain,
                type_name,
                document,
            } => self
                .store_object(&domain, &type_name, document)
                .await
                .map(Reply::Object),
            Command::Put {
                domain,
                type_name,
                id,
                document,
            } => self
                .store_object(&domain, &type_name, document.with_id(id))
                .await
                .map(Reply::Object),
            Command::Patch {
                domain,
                type_name,
                id,
                patch,
            } => self
                .patch_object(&domain, &type_name, &id, &patch)
                .await
                .map(Reply::Object),
            Command::Get {
                domain,
                type_name,
                id,
            } => self
                .get_object(&domain, &type_name, &id)
                .await
                .map(Reply::Document),
            Command::Delete {
                domain,
                type_name,
                id,
            } => self
                .delete_object(&domain, &type_name, &id)
                .await
                .map(Reply::Object),
        }
    }
}
