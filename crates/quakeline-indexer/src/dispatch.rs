//! Listener notification.
//!
//! Each listener gets its own queue and its own tokio task, so a slow or
//! failing listener never blocks resolution or its peers. Events are queued
//! while the indexer still holds its write lock, which preserves commit
//! order per listener.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::changes::IndexerEvent;

/// Error returned by a listener that could not process a notification.
///
/// Listener failures are logged and dropped; they never affect the commit
/// that produced the notification.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A consumer of committed change notifications.
///
/// Implementations receive every non-empty [`IndexerEvent`] in commit
/// order. Processing happens on a dedicated task per listener.
pub trait IndexerListener: Send + Sync + 'static {
    fn on_indexer_event(&self, event: &IndexerEvent) -> Result<(), ListenerError>;
}

pub(crate) struct ListenerSet {
    queues: Vec<mpsc::UnboundedSender<Arc<IndexerEvent>>>,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self { queues: Vec::new() }
    }

    /// Spawns the listener's delivery task. Requires a tokio runtime.
    pub(crate) fn add(&mut self, listener: Box<dyn IndexerListener>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Arc<IndexerEvent>>();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(err) = listener.on_indexer_event(&event) {
                    warn!(error = %err, changes = event.changes.len(), "listener failed");
                }
            }
        });
        self.queues.push(tx);
    }

    /// Queues the event for every listener. Never blocks; a send only fails
    /// when a delivery task has already shut down, which only happens at
    /// teardown.
    pub(crate) fn dispatch(&self, event: IndexerEvent) {
        if self.queues.is_empty() {
            return;
        }
        let event = Arc::new(event);
        for queue in &self.queues {
            if queue.send(Arc::clone(&event)).is_err() {
                warn!("listener queue closed, notification dropped");
            }
        }
    }
}
