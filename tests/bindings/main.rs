//! Binding integration tests.

#[cfg(feature = "grpc")]
mod grpc;
#[cfg(feature = "http")]
mod http;
mod rpc;
mod support;
