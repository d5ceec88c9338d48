//! Storage provider - durable keyed document storage consumed by the store.
//!
//! The store never owns persistence. It asks a [`StorageProvider`] to create
//! collections and to get, put and remove documents, and treats whatever
//! consistency the provider offers as the provider's business.

mod error;
mod in_memory;

use async_trait::async_trait;

use crate::document::Document;

pub use error::StorageError;
pub use in_memory::InMemoryStorage;

/// Abstract document storage.
///
/// Implementations might include:
/// - `InMemoryStorage` - For testing and single-process scenarios
/// - a document database, with one table per (domain, type)
#[async_trait]
pub trait StorageProvider: Send + Sync + 'static {
    /// Ensure the collection exists. Returns `true` if it was created by this
    /// call, `false` if it was already there.
    async fn create_collection(&self, domain: &str, type_name: &str) -> Result<bool, StorageError>;

    /// Point lookup by id.
    async fn get(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
    ) -> Result<Option<Document>, StorageError>;

    /// Insert or replace a document, assigning an id if it has none.
    /// Returns the document's id.
    async fn put(
        &self,
        domain: &str,
        type_name: &str,
        document: Document,
    ) -> Result<String, StorageError>;

    /// Remove a document. Returns `false` if there was nothing to remove.
    async fn remove(&self, domain: &str, type_name: &str, id: &str) -> Result<bool, StorageError>;
}
