use thiserror::Error;

use crate::bus::ChannelError;
use crate::document::PatchError;
use crate::storage::StorageError;

/// Error returned by every Store Core operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The target collection or document does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// The patch was missing, empty or malformed.
    #[error("invalid patch: {0}")]
    InvalidPatch(#[from] PatchError),
    /// The storage provider failed.
    #[error("storage provider error: {0}")]
    Provider(StorageError),
    /// The message channel failed.
    #[error("message channel error: {0}")]
    Channel(#[from] ChannelError),
}

impl StoreError {
    pub fn document_not_found(domain: &str, type_name: &str, id: &str) -> Self {
        StoreError::NotFound(format!("document {domain}.{type_name}.{id}"))
    }

    /// Map this error to an HTTP-style status code.
    ///
    /// Provider and channel failures render like `NotFound`; callers cannot
    /// tell them apart by status.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::InvalidPatch(_) => 400,
            StoreError::NotFound(_) | StoreError::Provider(_) | StoreError::Channel(_) => 404,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CollectionNotFound { domain, type_name } => {
                StoreError::NotFound(format!("collection {domain}.{type_name}"))
            }
            other => StoreError::Provider(other),
        }
    }
}
