//! HTTP binding integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

use std::sync::Arc;

use glued_store::binding::http;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::support::{store, TestStore};

/// Bind to port 0 and return the base URL.
async fn start_server(store: Arc<TestStore>) -> String {
    let app = http::router(store);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_check() {
    let (store, _) = store();
    let base = start_server(store).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn create_type_status_codes() {
    let (store, channel) = store();
    let base = start_server(store).await;
    let client = reqwest::Client::new();

    let resp = client.put(format!("{base}/test/fresh")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = client.put(format!("{base}/test/fresh")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert_eq!(channel.find_all_by_topic("store.test.fresh.type.created").len(), 1);
}

#[tokio::test]
async fn document_lifecycle() {
    let (store, channel) = store();
    let base = start_server(store).await;
    let client = reqwest::Client::new();

    // POST without id: 201 with the assigned id
    let resp = client
        .post(format!("{base}/test/tbl"))
        .json(&json!({ "a": 1, "b": { "x": 1 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    // Same document again: 204, no second notification
    let resp = client
        .put(format!("{base}/test/tbl/{id}"))
        .json(&json!({ "a": 1, "b": { "x": 1 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(channel.len(), 1);

    // PATCH merges
    let resp = client
        .patch(format!("{base}/test/tbl/{id}"))
        .json(&json!({ "items": [{ "action": "update", "patch": { "b": { "y": 2 } } }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client.get(format!("{base}/test/tbl/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "id": id, "a": 1, "b": { "x": 1, "y": 2 } }));

    let resp = client.delete(format!("{base}/test/tbl/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client.get(format!("{base}/test/tbl/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("not found"));

    assert_eq!(
        channel.topics(),
        vec![
            format!("store.test.tbl.{id}.inserted"),
            format!("store.test.tbl.{id}.updated"),
            format!("store.test.tbl.{id}.deleted"),
        ]
    );
}

#[tokio::test]
async fn put_with_path_id_inserts() {
    let (store, _) = store();
    let base = start_server(store).await;
    let client = reqwest::Client::new();

    let resp = client
        .put(format!("{base}/test/tbl/123"))
        .json(&json!({ "id": "ignored", "a": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "id": "123" }));
}

#[tokio::test]
async fn bad_patches_are_400() {
    let (store, _) = store();
    let base = start_server(store).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/test/tbl"))
        .json(&json!({ "id": "p" }))
        .send()
        .await
        .unwrap();

    for body in [json!({ "items": [] }), json!({ "action": "update" }), json!([1, 2])] {
        let resp = client
            .patch(format!("{base}/test/tbl/p"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
        let reply: Value = resp.json().await.unwrap();
        assert!(reply["message"].is_string());
    }
}

#[tokio::test]
async fn missing_targets_are_404() {
    let (store, _) = store();
    let base = start_server(store).await;
    let client = reqwest::Client::new();

    let resp = client
        .patch(format!("{base}/test/tbl/ghost"))
        .json(&json!({ "items": [{ "action": "update", "patch": { "a": 1 } }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client.delete(format!("{base}/test/tbl/ghost")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Unknown collection
    let resp = client
        .post(format!("{base}/test/nope"))
        .json(&json!({ "a": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "collection test.nope not found" }));
}

#[tokio::test]
async fn non_object_body_is_400() {
    let (store, _) = store();
    let base = start_server(store).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/test/tbl"))
        .json(&json!("just a string"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{base}/test/tbl"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
