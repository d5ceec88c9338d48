//! RPC binding over the in-memory channel's request/reply services.

use std::sync::Arc;

use glued_store::binding::rpc::{self, RpcReply, RpcRequest, DEFAULT_SERVICE};
use glued_store::{ChannelError, MessageChannel, Verb};
use serde_json::{json, Value};

use crate::support::{store, POLL, TIMEOUT};

async fn request(channel: &impl MessageChannel, request: RpcRequest) -> RpcReply {
    rpc::call(channel, DEFAULT_SERVICE, &request, TIMEOUT).await.unwrap()
}

#[tokio::test]
async fn full_lifecycle() {
    let (store, channel) = store();
    let handle = rpc::accept(Arc::clone(&store), channel.as_ref(), DEFAULT_SERVICE, POLL)
        .await
        .unwrap();
    let channel = channel.as_ref();

    let reply = request(channel, RpcRequest::new(Verb::Create, "test", "rpc")).await;
    assert_eq!(reply, RpcReply::data(json!({ "action": "created" })));

    let reply = request(
        channel,
        RpcRequest::new(Verb::Post, "test", "rpc").with_object(json!({ "id": "a", "n": 1 })),
    )
    .await;
    assert_eq!(reply, RpcReply::data(json!({ "id": "a", "action": "inserted" })));

    // put folds `id` into the object
    let reply = request(
        channel,
        RpcRequest::new(Verb::Put, "test", "rpc")
            .with_id("a")
            .with_object(json!({ "n": 2 })),
    )
    .await;
    assert_eq!(reply, RpcReply::data(json!({ "id": "a", "action": "updated" })));

    let reply = request(
        channel,
        RpcRequest::new(Verb::Patch, "test", "rpc").with_id("a").with_object(json!({
            "items": [{ "action": "update", "patch": { "m": 3 } }]
        })),
    )
    .await;
    assert_eq!(reply, RpcReply::data(json!({ "id": "a", "action": "updated" })));

    let reply = request(channel, RpcRequest::new(Verb::Get, "test", "rpc").with_id("a")).await;
    assert_eq!(reply, RpcReply::data(json!({ "id": "a", "n": 2, "m": 3 })));

    let reply = request(channel, RpcRequest::new(Verb::Delete, "test", "rpc").with_id("a")).await;
    assert_eq!(reply, RpcReply::data(json!({ "id": "a", "action": "deleted" })));

    let stats = handle.stop().await;
    assert_eq!(stats.handled, 6);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn errors_become_error_replies() {
    let (store, channel) = store();
    let handle = rpc::accept(store, channel.as_ref(), DEFAULT_SERVICE, POLL)
        .await
        .unwrap();
    let channel = channel.as_ref();

    let reply = request(channel, RpcRequest::new(Verb::Get, "test", "tbl").with_id(404)).await;
    assert!(reply.is_error());
    assert_eq!(
        reply.into_result(),
        Err("document test.tbl.404 not found".to_string())
    );

    let reply = request(
        channel,
        RpcRequest::new(Verb::Patch, "test", "tbl")
            .with_id("x")
            .with_object(json!({ "items": [] })),
    )
    .await;
    assert_eq!(
        reply.into_result(),
        Err("invalid patch: Patch contains no items".to_string())
    );

    let raw = channel
        .rpc_request(
            DEFAULT_SERVICE,
            br#"{"method":"upsert","domain":"test","type":"tbl"}"#.to_vec(),
            TIMEOUT,
        )
        .await
        .unwrap();
    let reply: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(reply, json!({ "error": { "message": "unknown method: upsert" } }));

    let stats = handle.stop().await;
    assert_eq!(stats.failed, 3);
}

#[tokio::test]
async fn legacy_type_method_creates_collection() {
    let (store, channel) = store();
    let _handle = rpc::accept(store, channel.as_ref(), DEFAULT_SERVICE, POLL)
        .await
        .unwrap();

    let raw = channel
        .rpc_request(
            DEFAULT_SERVICE,
            br#"{"method":"type","domain":"test","type":"legacy"}"#.to_vec(),
            TIMEOUT,
        )
        .await
        .unwrap();
    let reply: RpcReply = serde_json::from_slice(&raw).unwrap();
    assert_eq!(reply, RpcReply::data(json!({ "action": "created" })));
}

#[tokio::test]
async fn no_responder_without_accept() {
    let (_, channel) = store();
    let err = rpc::call(
        channel.as_ref(),
        DEFAULT_SERVICE,
        &RpcRequest::new(Verb::Create, "test", "tbl"),
        TIMEOUT,
    )
    .await
    .unwrap_err();
    assert_eq!(err, ChannelError::NoResponder(DEFAULT_SERVICE.to_string()));
}

#[tokio::test]
async fn stopped_binding_stops_responding() {
    let (store, channel) = store();
    let handle = rpc::accept(store, channel.as_ref(), DEFAULT_SERVICE, POLL)
        .await
        .unwrap();
    handle.stop().await;

    let err = rpc::call(
        channel.as_ref(),
        DEFAULT_SERVICE,
        &RpcRequest::new(Verb::Create, "test", "tbl"),
        TIMEOUT,
    )
    .await
    .unwrap_err();
    assert_eq!(err, ChannelError::NoResponder(DEFAULT_SERVICE.to_string()));
}

#[tokio::test]
async fn put_without_id_inserts() {
    let (store, channel) = store();
    let handle = rpc::accept(Arc::clone(&store), channel.as_ref(), DEFAULT_SERVICE, POLL)
        .await
        .unwrap();

    let reply = request(
        channel.as_ref(),
        RpcRequest::new(Verb::Put, "test", "tbl").with_object(json!({ "id": "body", "n": 1 })),
    )
    .await;
    let data = reply.into_result().unwrap();
    assert_eq!(data["action"], json!("inserted"));

    let id = data["id"].as_str().unwrap();
    assert_ne!(id, "body");
    assert_eq!(store.storage().count("test", "tbl"), 1);
    assert!(channel.find_by_topic(&format!("store.test.tbl.{id}.inserted")).is_some());

    handle.stop().await;
}
