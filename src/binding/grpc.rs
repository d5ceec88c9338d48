//! gRPC transport for the RPC binding.
//!
//! Requires the `grpc` feature. Uses tonic for the server and prost for
//! message serialization (standard protobuf wire format, no `.proto` file).
//!
//! ## RPCs
//!
//! - `Dispatch`: run one store request. The envelope's `json` carries an
//!   [`RpcRequest`](super::rpc::RpcRequest) in and an
//!   [`RpcReply`](super::rpc::RpcReply) out; `status` carries the
//!   HTTP-style status of the outcome.
//! - `Health`: health check listing the supported methods.
//!
//! ## Example
//!
//! ```ignore
//! let store = Arc::new(Store::new(InMemoryStorage::new(), InMemoryChannel::new()));
//!
//! // Get the server to compose with other tonic routes
//! let svc = grpc::grpc_server(store.clone());
//!
//! // Or serve directly
//! grpc::serve_grpc(store, "[::1]:50051".parse()?).await?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::warn;

use super::rpc::{decode_request, RpcBinding, RpcReply};
use crate::store::{DocumentStore, Verb};

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

#[derive(Clone, prost::Message)]
pub struct RpcEnvelope {
    /// Status of a reply; ignored on requests.
    #[prost(uint32, tag = "1")]
    pub status: u32,
    #[prost(string, tag = "2")]
    pub json: String,
}

impl RpcEnvelope {
    /// Wrap a request for sending.
    pub fn request(request: &super::rpc::RpcRequest) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status: 0,
            json: serde_json::to_string(request)?,
        })
    }

    /// Decode the reply carried by this envelope.
    pub fn reply(&self) -> Result<RpcReply, serde_json::Error> {
        serde_json::from_str(&self.json)
    }
}

#[derive(Clone, prost::Message)]
pub struct HealthRequest {}

#[derive(Clone, prost::Message)]
pub struct HealthResponse {
    #[prost(bool, tag = "1")]
    pub ok: bool,
    #[prost(string, repeated, tag = "2")]
    pub methods: Vec<String>,
}

// ---------------------------------------------------------------------------
// Generated service trait + server/client
// ---------------------------------------------------------------------------

include!(concat!(env!("OUT_DIR"), "/glued.store.StoreRpc.rs"));

pub use store_rpc_client::StoreRpcClient;
pub use store_rpc_server::{StoreRpc, StoreRpcServer};

// ---------------------------------------------------------------------------
// Handler implementation
// ---------------------------------------------------------------------------

/// gRPC handler wrapping an [`RpcBinding`].
pub struct GrpcHandler<D> {
    binding: RpcBinding<D>,
}

impl<D: DocumentStore> GrpcHandler<D> {
    pub fn new(store: Arc<D>) -> Self {
        Self {
            binding: RpcBinding::new(store),
        }
    }
}

#[tonic::async_trait]
impl<D: DocumentStore> StoreRpc for GrpcHandler<D> {
    async fn dispatch(
        &self,
        request: Request<RpcEnvelope>,
    ) -> Result<Response<RpcEnvelope>, Status> {
        let envelope = request.into_inner();

        let (status, reply) = match decode_request(envelope.json.as_bytes()) {
            Ok(request) => match self.binding.execute(request).await {
                Ok(reply) => (200, RpcReply::data(reply.to_value())),
                Err(e) => {
                    warn!(error = %e, "grpc dispatch failed");
                    (e.status_code(), RpcReply::error(e.to_string()))
                }
            },
            Err(e) => {
                warn!(error = %e, "undecodable grpc request");
                (e.status_code(), RpcReply::error(e.to_string()))
            }
        };

        let json = serde_json::to_string(&reply).map_err(|e| Status::internal(e.to_string()))?;
        Ok(Response::new(RpcEnvelope {
            status: u32::from(status),
            json,
        }))
    }

    async fn health(
        &self,
        _request: Request<HealthRequest>,
    ) -> Result<Response<HealthResponse>, Status> {
        Ok(Response::new(HealthResponse {
            ok: true,
            methods: Verb::ALL.iter().map(|v| v.as_str().to_string()).collect(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

/// Create a `StoreRpcServer` from a shared store.
pub fn grpc_server<D: DocumentStore>(store: Arc<D>) -> StoreRpcServer<GrpcHandler<D>> {
    StoreRpcServer::new(GrpcHandler::new(store))
}

/// Bind and serve the gRPC transport at the given address.
pub async fn serve_grpc<D: DocumentStore>(
    store: Arc<D>,
    addr: SocketAddr,
) -> Result<(), tonic::transport::Error> {
    tonic::transport::Server::builder()
        .add_service(grpc_server(store))
        .serve(addr)
        .await
}
