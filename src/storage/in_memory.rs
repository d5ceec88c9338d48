use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use super::{StorageError, StorageProvider};
use crate::document::Document;

type CollectionKey = (String, String);
type Collection = HashMap<String, Document>;

/// HashMap-backed storage provider.
///
/// Clones share the same collections. Documents are cloned in and out, so
/// callers only ever see snapshots.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    collections: Arc<RwLock<HashMap<CollectionKey, Collection>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that pre-creates a collection.
    pub fn with_collection(self, domain: &str, type_name: &str) -> Self {
        if let Ok(mut collections) = self.collections.write() {
            collections.entry(key(domain, type_name)).or_default();
        }
        self
    }

    /// Check whether a collection exists.
    pub fn has_collection(&self, domain: &str, type_name: &str) -> bool {
        self.collections
            .read()
            .map(|c| c.contains_key(&key(domain, type_name)))
            .unwrap_or_default()
    }

    /// Number of documents in a collection (0 if it does not exist).
    pub fn count(&self, domain: &str, type_name: &str) -> usize {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(&key(domain, type_name)).map(|docs| docs.len()))
            .unwrap_or_default()
    }
}

fn key(domain: &str, type_name: &str) -> CollectionKey {
    (domain.to_string(), type_name.to_string())
}

#[async_trait]
impl StorageProvider for InMemoryStorage {
    async fn create_collection(&self, domain: &str, type_name: &str) -> Result<bool, StorageError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned("create collection"))?;

        let collection_key = key(domain, type_name);
        if collections.contains_key(&collection_key) {
            return Ok(false);
        }
        collections.insert(collection_key, Collection::new());
        Ok(true)
    }

    async fn get(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
    ) -> Result<Option<Document>, StorageError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StorageError::LockPoisoned("read"))?;

        let collection = collections
            .get(&key(domain, type_name))
            .ok_or_else(|| StorageError::collection_not_found(domain, type_name))?;
        Ok(collection.get(id).cloned())
    }

    async fn put(
        &self,
        domain: &str,
        type_name: &str,
        mut document: Document,
    ) -> Result<String, StorageError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned("write"))?;

        let collection = collections
            .get_mut(&key(domain, type_name))
            .ok_or_else(|| StorageError::collection_not_found(domain, type_name))?;

        let id = match document.id() {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                document.set_id(id.clone());
                id
            }
        };
        collection.insert(id.clone(), document);
        Ok(id)
    }

    async fn remove(&self, domain: &str, type_name: &str, id: &str) -> Result<bool, StorageError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned("remove"))?;

        let collection = collections
            .get_mut(&key(domain, type_name))
            .ok_or_else(|| StorageError::collection_not_found(domain, type_name))?;
        Ok(collection.remove(id).is_some())
    }
}
