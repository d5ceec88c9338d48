use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::{Action, DocumentStore, Notification, ObjectOutcome, TypeOutcome};
use crate::bus::MessageChannel;
use crate::document::{Document, Patch};
use crate::error::StoreError;
use crate::storage::{StorageError, StorageProvider};

/// The store core: a storage provider, a message channel, and the
/// classification logic between them.
///
/// Holds no mutable state of its own. Cloning is cheap and every clone
/// shares the same provider and channel.
///
/// Operations on the same document are not serialized: two concurrent
/// writers can both read the same prior state and the last write wins.
pub struct Store<S, C> {
    storage: Arc<S>,
    channel: Arc<C>,
}

impl<S, C> Clone for Store<S, C> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            channel: Arc::clone(&self.channel),
        }
    }
}

impl<S: StorageProvider, C: MessageChannel> Store<S, C> {
    pub fn new(storage: S, channel: C) -> Self {
        Self::from_shared(Arc::new(storage), Arc::new(channel))
    }

    /// Build from handles the caller keeps using (e.g. to inspect a channel in tests).
    pub fn from_shared(storage: Arc<S>, channel: Arc<C>) -> Self {
        Self { storage, channel }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    async fn notify(&self, notification: Notification) -> Result<(), StoreError> {
        let payload = notification.to_bytes()?;
        self.channel
            .publish(&notification.topic, payload)
            .await
            .map_err(|e| {
                warn!(topic = %notification.topic, error = %e, "notification publish failed");
                StoreError::from(e)
            })?;
        debug!(topic = %notification.topic, "notification published");
        Ok(())
    }

    async fn put(
        &self,
        domain: &str,
        type_name: &str,
        document: Document,
    ) -> Result<String, StoreError> {
        self.storage
            .put(domain, type_name, document)
            .await
            .map_err(|e| provider_failure(e, "put", domain, type_name))
    }

    async fn fetch(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        self.storage
            .get(domain, type_name, id)
            .await
            .map_err(|e| provider_failure(e, "get", domain, type_name))
    }

    async fn fetch_existing(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
    ) -> Result<Document, StoreError> {
        self.fetch(domain, type_name, id)
            .await?
            .ok_or_else(|| StoreError::document_not_found(domain, type_name, id))
    }
}

fn provider_failure(
    err: StorageError,
    operation: &str,
    domain: &str,
    type_name: &str,
) -> StoreError {
    if !matches!(err, StorageError::CollectionNotFound { .. }) {
        warn!(domain, type_name, operation, error = %err, "storage provider failed");
    }
    StoreError::from(err)
}

#[async_trait]
impl<S: StorageProvider, C: MessageChannel> DocumentStore for Store<S, C> {
    async fn create_type(&self, domain: &str, type_name: &str) -> Result<TypeOutcome, StoreError> {
        let created = self
            .storage
            .create_collection(domain, type_name)
            .await
            .map_err(|e| provider_failure(e, "create_collection", domain, type_name))?;

        if !created {
            return Ok(TypeOutcome { action: Action::None });
        }

        debug!(domain, type_name, action = %Action::Created, "collection created");
        self.notify(Notification::type_created(domain, type_name)).await?;
        Ok(TypeOutcome {
            action: Action::Created,
        })
    }

    async fn store_object(
        &self,
        domain: &str,
        type_name: &str,
        document: Document,
    ) -> Result<ObjectOutcome, StoreError> {
        let (id, action, stored) = match document.id() {
            None => {
                let id = self.put(domain, type_name, document.clone()).await?;
                let stored = document.with_id(id.clone());
                (id, Action::Inserted, stored)
            }
            Some(id) => match self.fetch(domain, type_name, &id).await? {
                Some(existing) if existing.is_equal(&document) => {
                    return Ok(ObjectOutcome::new(id, Action::None));
                }
                existing => {
                    let action = if existing.is_some() {
                        Action::Updated
                    } else {
                        Action::Inserted
                    };
                    self.put(domain, type_name, document.clone()).await?;
                    (id, action, document)
                }
            },
        };

        debug!(domain, type_name, id = %id, action = %action, "document stored");
        self.notify(Notification::object(
            domain,
            type_name,
            &id,
            action,
            stored.into_value(),
        ))
        .await?;
        Ok(ObjectOutcome::new(id, action))
    }

    async fn patch_object(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
        patch: &Patch,
    ) -> Result<ObjectOutcome, StoreError> {
        patch.validate()?;

        let original = self.fetch_existing(domain, type_name, id).await?;
        let patched = original.patched(patch);
        if patched.is_equal(&original) {
            return Ok(ObjectOutcome::new(id, Action::None));
        }

        self.put(domain, type_name, patched).await?;
        debug!(domain, type_name, id, action = %Action::Updated, "document patched");
        self.notify(Notification::object(
            domain,
            type_name,
            id,
            Action::Updated,
            patch.to_value(),
        ))
        .await?;
        Ok(ObjectOutcome::new(id, Action::Updated))
    }

    async fn get_object(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
    ) -> Result<Document, StoreError> {
        self.fetch_existing(domain, type_name, id).await
    }

    async fn delete_object(
        &self,
        domain: &str,
        type_name: &str,
        id: &str,
    ) -> Result<ObjectOutcome, StoreError> {
        let removed = self
            .storage
            .remove(domain, type_name, id)
            .await
            .map_err(|e| provider_failure(e, "remove", domain, type_name))?;
        if !removed {
            return Err(StoreError::document_not_found(domain, type_name, id));
        }

        debug!(domain, type_name, id, action = %Action::Deleted, "document deleted");
        self.notify(Notification::object(
            domain,
            type_name,
            id,
            Action::Deleted,
            json!({ "id": id }),
        ))
        .await?;
        Ok(ObjectOutcome::new(id, Action::Deleted))
    }
}
