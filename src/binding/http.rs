//! HTTP binding - REST-style routes over axum.
//!
//! Requires the `http` feature.
//!
//! ## Routes
//!
//! | Route | Operation | Success |
//! |---|---|---|
//! | `PUT /:domain/:type` | create type | 201 created, 204 none |
//! | `POST /:domain/:type` | store (body id or assigned) | 201 `{id}` inserted, 204 otherwise |
//! | `PUT /:domain/:type/:id` | store (id from path) | 201 `{id}` inserted, 204 otherwise |
//! | `PATCH /:domain/:type/:id` | patch | 204 |
//! | `GET /:domain/:type/:id` | get | 200 + document |
//! | `DELETE /:domain/:type/:id` | delete | 204 |
//! | `GET /health` | health check | 200 `{ "ok": true }` |
//!
//! Errors render as `{ "message": ... }`: 400 for an invalid patch or body,
//! 404 for everything else.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use glued_store::{binding::http, InMemoryChannel, InMemoryStorage, Store};
//!
//! let store = Arc::new(Store::new(InMemoryStorage::new(), InMemoryChannel::new()));
//!
//! // Get the router to compose with other axum routes
//! let app = http::router(store.clone());
//!
//! // Or serve directly
//! http::serve(store, "127.0.0.1:9210").await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::warn;

use super::{decode_command, BindingError};
use crate::store::{Action, Command, DocumentStore, Reply, Verb};

/// Build an axum `Router` serving the store.
pub fn router<D: DocumentStore>(store: Arc<D>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/:domain/:type_name",
            put(create_type_handler::<D>).post(post_handler::<D>),
        )
        .route(
            "/:domain/:type_name/:id",
            put(put_handler::<D>)
                .patch(patch_handler::<D>)
                .get(get_handler::<D>)
                .delete(delete_handler::<D>),
        )
        .with_state(store)
}

/// Serve the store over HTTP at the given address (e.g. `"127.0.0.1:9210"`).
pub async fn serve<D: DocumentStore>(store: Arc<D>, addr: &str) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(store)).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<D, F>(
    store: Arc<D>,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    D: DocumentStore,
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

/// `GET /health`
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// `PUT /:domain/:type`
async fn create_type_handler<D: DocumentStore>(
    State(store): State<Arc<D>>,
    Path((domain, type_name)): Path<(String, String)>,
) -> Response {
    run(&*store, decode_command(Verb::Create, &domain, &type_name, None, None)).await
}

/// `POST /:domain/:type`
async fn post_handler<D: DocumentStore>(
    State(store): State<Arc<D>>,
    Path((domain, type_name)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let command = json_body(body)
        .and_then(|body| decode_command(Verb::Post, &domain, &type_name, None, Some(body)));
    run(&*store, command).await
}

/// `PUT /:domain/:type/:id`
async fn put_handler<D: DocumentStore>(
    State(store): State<Arc<D>>,
    Path((domain, type_name, id)): Path<(String, String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let command = json_body(body)
        .and_then(|body| decode_command(Verb::Put, &domain, &type_name, Some(id), Some(body)));
    run(&*store, command).await
}

/// `PATCH /:domain/:type/:id`
async fn patch_handler<D: DocumentStore>(
    State(store): State<Arc<D>>,
    Path((domain, type_name, id)): Path<(String, String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let command = json_body(body)
        .and_then(|body| decode_command(Verb::Patch, &domain, &type_name, Some(id), Some(body)));
    run(&*store, command).await
}

/// `GET /:domain/:type/:id`
async fn get_handler<D: DocumentStore>(
    State(store): State<Arc<D>>,
    Path((domain, type_name, id)): Path<(String, String, String)>,
) -> Response {
    run(&*store, decode_command(Verb::Get, &domain, &type_name, Some(id), None)).await
}

/// `DELETE /:domain/:type/:id`
async fn delete_handler<D: DocumentStore>(
    State(store): State<Arc<D>>,
    Path((domain, type_name, id)): Path<(String, String, String)>,
) -> Response {
    run(&*store, decode_command(Verb::Delete, &domain, &type_name, Some(id), None)).await
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, BindingError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| BindingError::Decode(rejection.body_text()))
}

async fn run<D: DocumentStore>(store: &D, command: Result<Command, BindingError>) -> Response {
    let command = match command {
        Ok(command) => command,
        Err(e) => return error_response(e),
    };

    let verb = command.verb();
    match store.dispatch(command).await {
        Ok(reply) => render(reply),
        Err(e) => {
            warn!(verb = %verb, error = %e, "http request failed");
            error_response(e.into())
        }
    }
}

fn render(reply: Reply) -> Response {
    match reply {
        Reply::Type(outcome) if outcome.action == Action::Created => {
            StatusCode::CREATED.into_response()
        }
        Reply::Object(outcome) if outcome.action == Action::Inserted => {
            (StatusCode::CREATED, Json(json!({ "id": outcome.id }))).into_response()
        }
        Reply::Document(document) => (StatusCode::OK, Json(document)).into_response(),
        Reply::Type(_) | Reply::Object(_) => StatusCode::NO_CONTENT.into_response(),
    }
}

fn error_response(err: BindingError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::NOT_FOUND);
    (status, Json(json!({ "message": err.to_string() }))).into_response()
}
