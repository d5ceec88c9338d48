//! In-process listeners via `EmitterChannel`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use glued_store::{DocumentStore, EmitterChannel, InMemoryChannel, InMemoryStorage, Store};
use serde_json::{json, Value};

use crate::support::doc;

#[tokio::test]
async fn listener_sees_delete_notification() {
    let channel = EmitterChannel::new(InMemoryChannel::recording());
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    channel
        .on("store.test.tbl.123.deleted", move |payload| {
            sink.lock().unwrap().push(payload);
        })
        .unwrap();

    let store = Store::new(InMemoryStorage::new().with_collection("test", "tbl"), channel);
    store
        .store_object("test", "tbl", doc(json!({ "id": 123 })))
        .await
        .unwrap();
    store.delete_object("test", "tbl", "123").await.unwrap();

    // Listeners run on the emitter's threads.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let payload: Value = serde_json::from_str(&received[0]).unwrap();
    assert_eq!(payload, json!({ "id": "123" }));

    assert_eq!(store.channel().inner().len(), 2);
}
