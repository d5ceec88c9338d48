use std::sync::Arc;
use std::time::Duration;

use glued_store::{InMemoryChannel, InMemoryStorage, Store};

pub type TestStore = Store<InMemoryStorage, InMemoryChannel>;

pub const POLL: Duration = Duration::from_millis(20);
pub const TIMEOUT: Duration = Duration::from_secs(2);

/// A shared store with `test.tbl` created, and its channel.
pub fn store() -> (Arc<TestStore>, Arc<InMemoryChannel>) {
    let channel = Arc::new(InMemoryChannel::recording());
    let store = Store::from_shared(
        Arc::new(InMemoryStorage::new().with_collection("test", "tbl")),
        Arc::clone(&channel),
    );
    (Arc::new(store), channel)
}

/// Poll until `check` holds or the timeout elapses.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
