use thiserror::Error;

/// Error returned by a [`StorageProvider`](super::StorageProvider).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("collection {domain}.{type_name} does not exist")]
    CollectionNotFound { domain: String, type_name: String },
    #[error("storage lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn collection_not_found(domain: &str, type_name: &str) -> Self {
        StorageError::CollectionNotFound {
            domain: domain.to_string(),
            type_name: type_name.to_string(),
        }
    }
}
