//! gRPC transport integration tests.
//!
//! Starts a tonic server and exercises it with the generated client.

use std::sync::Arc;

use glued_store::binding::grpc::{self, HealthRequest, RpcEnvelope, StoreRpcClient};
use glued_store::binding::rpc::{RpcReply, RpcRequest};
use glued_store::Verb;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

use crate::support::{store, TestStore};

/// Bind to port 0, spawn the gRPC server, and return a connected client.
async fn start_server(store: Arc<TestStore>) -> StoreRpcClient<tonic::transport::Channel> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let svc = grpc::grpc_server(store);
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(svc)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    StoreRpcClient::connect(format!("http://{addr}")).await.unwrap()
}

#[tokio::test]
async fn health_lists_methods() {
    let (store, _) = store();
    let mut client = start_server(store).await;

    let resp = client.health(HealthRequest {}).await.unwrap().into_inner();
    assert!(resp.ok);
    assert_eq!(
        resp.methods,
        vec!["create", "post", "put", "patch", "get", "delete"]
    );
}

#[tokio::test]
async fn dispatch_post_then_get() {
    let (store, _) = store();
    let mut client = start_server(store).await;

    let request =
        RpcRequest::new(Verb::Post, "test", "tbl").with_object(json!({ "id": "g", "a": 1 }));
    let resp = client
        .dispatch(RpcEnvelope::request(&request).unwrap())
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.status, 200);
    assert_eq!(
        resp.reply().unwrap(),
        RpcReply::data(json!({ "id": "g", "action": "inserted" }))
    );

    let request = RpcRequest::new(Verb::Get, "test", "tbl").with_id("g");
    let resp = client
        .dispatch(RpcEnvelope::request(&request).unwrap())
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.reply().unwrap(), RpcReply::data(json!({ "id": "g", "a": 1 })));
}

#[tokio::test]
async fn dispatch_errors_carry_status() {
    let (store, _) = store();
    let mut client = start_server(store).await;

    let request = RpcRequest::new(Verb::Delete, "test", "tbl").with_id("ghost");
    let resp = client
        .dispatch(RpcEnvelope::request(&request).unwrap())
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.status, 404);
    assert!(resp.reply().unwrap().is_error());

    let resp = client
        .dispatch(RpcEnvelope {
            status: 0,
            json: "not json".into(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.status, 400);
}
