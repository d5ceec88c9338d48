//! Runs the store with in-memory storage and an in-memory channel, serving
//! all three bindings until ctrl-c.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use glued_store::binding::{http, pubsub, rpc};
use glued_store::{logging, InMemoryChannel, InMemoryStorage, Store, StoreConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init("glued_store=info");

    let config = StoreConfig::from_env()?;
    if config.storage_config.is_some() {
        warn!("storage config is ignored by the in-memory storage provider");
    }
    info!(
        broker = %config.broker_url,
        bus = %config.bus_name,
        "using in-process message channel"
    );

    let channel = Arc::new(InMemoryChannel::new());
    let store = Arc::new(Store::from_shared(
        Arc::new(InMemoryStorage::new()),
        Arc::clone(&channel),
    ));

    let rpc = rpc::accept(
        Arc::clone(&store),
        channel.as_ref(),
        &config.rpc_service,
        POLL_INTERVAL,
    )
    .await?;
    let pubsub = pubsub::subscribe(Arc::clone(&store), channel.as_ref(), POLL_INTERVAL).await?;

    let listener = TcpListener::bind(config.http_addr()).await?;
    info!(addr = %config.http_addr(), service = %config.rpc_service, "store listening");

    http::serve_with_shutdown(store, listener, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
        }
    })
    .await?;

    let rpc_stats = rpc.stop().await;
    let pubsub_stats = pubsub.stop().await;
    info!(
        rpc_handled = rpc_stats.handled,
        rpc_failed = rpc_stats.failed,
        pubsub_handled = pubsub_stats.handled,
        pubsub_failed = pubsub_stats.failed,
        "store stopped"
    );
    Ok(())
}
