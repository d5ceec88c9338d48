//! Background transport loops and their lifecycle handle.

use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Counters collected by a background transport.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransportStats {
    /// Requests or messages handled successfully.
    pub handled: usize,
    /// Requests or messages whose handling failed.
    pub failed: usize,
    /// Number of times the transport polled its source.
    pub polls: usize,
}

impl TransportStats {
    fn absorb(&mut self, other: TransportStats) {
        self.handled += other.handled;
        self.failed += other.failed;
        self.polls += other.polls;
    }
}

/// Handle to one or more spawned transport loops.
///
/// ## Example
///
/// ```ignore
/// let handle = pubsub::subscribe(store, &channel, Duration::from_millis(50)).await?;
///
/// // ... serve ...
///
/// let stats = handle.stop().await;
/// println!("handled {} commands", stats.handled);
/// ```
///
/// Dropping the handle signals the loops to stop without waiting for them.
pub struct TransportHandle {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<TransportStats>>,
}

/// Receiving end of a stop signal, handed to each loop.
#[derive(Clone)]
pub(crate) struct StopSignal(watch::Receiver<bool>);

impl StopSignal {
    /// Resolves once stop has been requested (or the handle is gone).
    pub(crate) async fn stopped(&mut self) {
        let _ = self.0.wait_for(|stop| *stop).await;
    }
}

impl TransportHandle {
    pub(crate) fn new() -> (Self, StopSignal) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = Self {
            stop_tx,
            tasks: Vec::new(),
        };
        (handle, StopSignal(stop_rx))
    }

    pub(crate) fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = TransportStats> + Send + 'static,
    {
        self.tasks.push(tokio::spawn(task));
    }

    /// Number of loops this handle controls.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Signal every loop to stop, wait for them, and sum their stats.
    pub async fn stop(mut self) -> TransportStats {
        let _ = self.stop_tx.send(true);

        let mut total = TransportStats::default();
        for task in self.tasks.drain(..) {
            match task.await {
                Ok(stats) => total.absorb(stats),
                Err(e) => warn!(error = %e, "transport task ended abnormally"),
            }
        }
        total
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}
