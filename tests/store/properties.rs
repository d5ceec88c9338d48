//! Idempotence, round-trip and notification properties of the store.

use std::sync::Arc;

use glued_store::{
    Action, DocumentStore, InMemoryChannel, InMemoryStorage, ObjectOutcome, Patch, Store,
    StoreError,
};
use serde_json::{json, Value};

use crate::support::{doc, store};

#[tokio::test]
async fn create_type_twice() {
    let (store, channel) = store();

    let first = store.create_type("test", "other").await.unwrap();
    let second = store.create_type("test", "other").await.unwrap();

    assert_eq!(first.action, Action::Created);
    assert_eq!(second.action, Action::None);
    assert_eq!(channel.find_all_by_topic("store.test.other.type.created").len(), 1);
    assert_eq!(channel.len(), 1);
}

#[tokio::test]
async fn round_trip_assigns_id() {
    let (store, _) = store();
    let body = json!({ "name": "widget", "tags": ["a", "b"], "dims": { "w": 2 } });

    let outcome = store.store_object("test", "tbl", doc(body.clone())).await.unwrap();
    assert_eq!(outcome.action, Action::Inserted);
    assert!(!outcome.id.is_empty());

    let mut expected = body;
    expected["id"] = Value::String(outcome.id.clone());
    let stored = store.get_object("test", "tbl", &outcome.id).await.unwrap();
    assert!(stored.is_equal(&doc(expected)));
}

#[tokio::test]
async fn storing_identical_document_is_a_no_op() {
    let (store, channel) = store();
    let body = doc(json!({ "id": "abc", "a": 1, "nested": { "b": [1, 2] } }));

    let first = store.store_object("test", "tbl", body.clone()).await.unwrap();
    let second = store.store_object("test", "tbl", body).await.unwrap();

    assert_eq!(first, ObjectOutcome::new("abc", Action::Inserted));
    assert_eq!(second, ObjectOutcome::new("abc", Action::None));
    assert_eq!(channel.len(), 1);
    assert_eq!(channel.topics(), vec!["store.test.tbl.abc.inserted"]);
}

#[tokio::test]
async fn key_order_does_not_make_an_update() {
    let (store, channel) = store();
    store
        .store_object("test", "tbl", doc(json!({ "id": "k", "a": 1, "b": { "x": 1, "y": 2 } })))
        .await
        .unwrap();

    let outcome = store
        .store_object("test", "tbl", doc(json!({ "b": { "y": 2, "x": 1 }, "a": 1, "id": "k" })))
        .await
        .unwrap();
    assert_eq!(outcome.action, Action::None);
    assert_eq!(channel.len(), 1);
}

#[tokio::test]
async fn replacing_publishes_the_full_document() {
    let (store, channel) = store();
    store
        .store_object("test", "tbl", doc(json!({ "id": "r", "a": 1, "b": 2 })))
        .await
        .unwrap();

    let outcome = store
        .store_object("test", "tbl", doc(json!({ "id": "r", "a": 5 })))
        .await
        .unwrap();
    assert_eq!(outcome.action, Action::Updated);

    let stored = store.get_object("test", "tbl", "r").await.unwrap();
    assert_eq!(stored.into_value(), json!({ "id": "r", "a": 5 }));

    let message = channel.find_by_topic("store.test.tbl.r.updated").unwrap();
    assert_eq!(message.decode::<Value>().unwrap(), json!({ "id": "r", "a": 5 }));
}

#[tokio::test]
async fn patch_merge_then_repeat() {
    let (store, channel) = store();
    store
        .store_object("test", "tbl", doc(json!({ "id": "p", "a": 1, "b": { "x": 1 } })))
        .await
        .unwrap();
    let patch = Patch::from_value(json!({
        "items": [{ "action": "update", "patch": { "b": { "y": 2 } } }]
    }))
    .unwrap();

    let first = store.patch_object("test", "tbl", "p", &patch).await.unwrap();
    assert_eq!(first.action, Action::Updated);
    assert_eq!(
        store.get_object("test", "tbl", "p").await.unwrap().into_value(),
        json!({ "id": "p", "a": 1, "b": { "x": 1, "y": 2 } })
    );

    let second = store.patch_object("test", "tbl", "p", &patch).await.unwrap();
    assert_eq!(second.action, Action::None);
    assert_eq!(channel.find_all_by_topic("store.test.tbl.p.updated").len(), 1);
}

#[tokio::test]
async fn patch_delete_nested_key() {
    let (store, channel) = store();
    store
        .store_object("test", "tbl", doc(json!({ "id": "d", "a": 1, "b": { "x": 1, "y": 2 } })))
        .await
        .unwrap();
    let patch = Patch::new().delete(json!({ "b": { "y": null } })).unwrap();

    let outcome = store.patch_object("test", "tbl", "d", &patch).await.unwrap();
    assert_eq!(outcome.action, Action::Updated);
    assert_eq!(
        store.get_object("test", "tbl", "d").await.unwrap().into_value(),
        json!({ "id": "d", "a": 1, "b": { "x": 1 } })
    );

    let message = channel.find_by_topic("store.test.tbl.d.updated").unwrap();
    assert_eq!(
        message.decode::<Value>().unwrap(),
        json!({ "items": [{ "action": "delete", "patch": { "b": { "y": null } } }] })
    );
}

#[tokio::test]
async fn patch_cannot_touch_the_id() {
    let (store, _) = store();
    store
        .store_object("test", "tbl", doc(json!({ "id": "fixed", "a": 1 })))
        .await
        .unwrap();
    let patch = Patch::new().update(json!({ "id": "moved" })).unwrap();

    let outcome = store.patch_object("test", "tbl", "fixed", &patch).await.unwrap();
    assert_eq!(outcome.action, Action::None);
    assert!(store.get_object("test", "tbl", "moved").await.is_err());
}

#[tokio::test]
async fn missing_targets() {
    let (store, channel) = store();
    let patch = Patch::new().update(json!({ "a": 1 })).unwrap();

    for result in [
        store.patch_object("test", "tbl", "ghost", &patch).await.map(|_| ()),
        store.delete_object("test", "tbl", "ghost").await.map(|_| ()),
        store.get_object("test", "tbl", "ghost").await.map(|_| ()),
    ] {
        assert!(matches!(result, Err(StoreError::NotFound(_))), "{result:?}");
    }
    assert!(channel.is_empty());
}

#[tokio::test]
async fn second_delete_is_not_found() {
    let (store, channel) = store();
    store
        .store_object("test", "tbl", doc(json!({ "id": 123, "a": 1 })))
        .await
        .unwrap();

    let outcome = store.delete_object("test", "tbl", "123").await.unwrap();
    assert_eq!(outcome, ObjectOutcome::new("123", Action::Deleted));
    assert!(matches!(
        store.delete_object("test", "tbl", "123").await,
        Err(StoreError::NotFound(_))
    ));

    let deleted = channel.find_all_by_topic("store.test.tbl.123.deleted");
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].decode::<Value>().unwrap(), json!({ "id": "123" }));
}

#[tokio::test]
async fn empty_patch_is_invalid() {
    let (store, _) = store();
    let patch = Patch::new();

    let err = store.patch_object("test", "tbl", "whatever", &patch).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidPatch(_)));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn numeric_and_string_ids_address_the_same_document() {
    let (store, _) = store();
    store
        .store_object("test", "tbl", doc(json!({ "id": 42, "a": 1 })))
        .await
        .unwrap();

    let stored = store.get_object("test", "tbl", "42").await.unwrap();
    assert_eq!(stored.get("id"), Some(&json!(42)));
}

#[tokio::test]
async fn default_channel_does_not_grow_with_traffic() {
    let storage = Arc::new(InMemoryStorage::new().with_collection("test", "tbl"));
    let channel = Arc::new(InMemoryChannel::new());
    let store = Store::from_shared(Arc::clone(&storage), Arc::clone(&channel));

    for i in 0..500 {
        let id = i.to_string();
        store
            .store_object("test", "tbl", doc(json!({ "id": id, "n": i })))
            .await
            .unwrap();
        store.delete_object("test", "tbl", &id).await.unwrap();
    }

    assert!(channel.is_empty());
    assert_eq!(storage.count("test", "tbl"), 0);
}
