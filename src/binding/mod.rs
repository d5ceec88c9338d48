//! Binding adapters - thin translators from a transport into the store.
//!
//! Every binding decodes its request into a [`Command`] with
//! [`decode_command`], runs it through [`DocumentStore::dispatch`], and
//! renders the [`Reply`](crate::store::Reply) in its own shape. None of
//! them computes actions or publishes notifications.
//!
//! | Binding | Module | Transport |
//! |---|---|---|
//! | HTTP | [`http`] (feature `http`) | axum routes |
//! | RPC | [`rpc`] | request/reply over a [`MessageChannel`](crate::bus::MessageChannel) |
//! | RPC | [`grpc`] (feature `grpc`) | tonic service carrying the same envelopes |
//! | PubSub | [`pubsub`] | command topics ending in `.store` |
//!
//! [`DocumentStore::dispatch`]: crate::store::DocumentStore::dispatch

#[cfg(feature = "grpc")]
pub mod grpc;
#[cfg(feature = "http")]
pub mod http;
pub mod pubsub;
pub mod rpc;
mod transport;

use serde_json::Value;
use thiserror::Error;

use crate::document::{Document, Patch, PatchError};
use crate::error::StoreError;
use crate::store::{Command, Verb};

pub use transport::{TransportHandle, TransportStats};

/// Error produced while handling one binding request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The request could not be turned into a command.
    #[error("{0}")]
    Decode(String),
    /// The store refused or failed the command.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BindingError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            BindingError::Decode(_) => 400,
            BindingError::Store(e) => e.status_code(),
        }
    }
}

impl From<PatchError> for BindingError {
    fn from(err: PatchError) -> Self {
        BindingError::Store(StoreError::InvalidPatch(err))
    }
}

/// Turn transport-level parts into a [`Command`].
///
/// - `create` ignores any body
/// - `post` requires an object body; its id (if any) comes from the body
/// - `put` writes `id` over the body's own id; without `id` the body id is
///   dropped and the document is inserted under an assigned id
/// - `patch` decodes the body as a [`Patch`]; a missing body is an empty patch
/// - `get` and `delete` require `id`
pub fn decode_command(
    verb: Verb,
    domain: &str,
    type_name: &str,
    id: Option<String>,
    body: Option<Value>,
) -> Result<Command, BindingError> {
    let domain = domain.to_string();
    let type_name = type_name.to_string();

    let command = match verb {
        Verb::Create => Command::CreateType { domain, type_name },
        Verb::Post => Command::Post {
            domain,
            type_name,
            document: decode_document(body)?,
        },
        Verb::Put => {
            let document = decode_document(body)?;
            match id {
                Some(id) => Command::Put {
                    domain,
                    type_name,
                    id,
                    document,
                },
                None => Command::Post {
                    domain,
                    type_name,
                    document: document.without_id(),
                },
            }
        }
        Verb::Patch => {
            let id = id.ok_or_else(|| missing_id(verb))?;
            let patch = match body {
                Some(value) => Patch::from_value(value)?,
                None => return Err(PatchError::NoItems.into()),
            };
            Command::Patch {
                domain,
                type_name,
                id,
                patch,
            }
        }
        Verb::Get => Command::Get {
            domain,
            type_name,
            id: id.ok_or_else(|| missing_id(verb))?,
        },
        Verb::Delete => Command::Delete {
            domain,
            type_name,
            id: id.ok_or_else(|| missing_id(verb))?,
        },
    };
    Ok(command)
}

fn decode_document(body: Option<Value>) -> Result<Document, BindingError> {
    match body {
        Some(value @ Value::Object(_)) => {
            Document::from_value(value).map_err(|e| BindingError::Decode(e.to_string()))
        }
        Some(_) => Err(BindingError::Decode(
            "document must be a JSON object".to_string(),
        )),
        None => Err(BindingError::Decode("missing document".to_string())),
    }
}

fn missing_id(verb: Verb) -> BindingError {
    BindingError::Decode(format!("{verb} requires an id"))
}
