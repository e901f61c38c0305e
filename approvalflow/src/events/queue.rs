//! Queued dispatch of events to a downstream sink.

use super::{EventSink, WorkflowEvent};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Counters for a [`QueuedEventSink`].
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    queued: AtomicU64,
    dropped: AtomicU64,
}

impl DispatchMetrics {
    /// Returns the number of events accepted into the queue.
    #[must_use]
    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }

    /// Returns the number of events dropped because the queue was full or closed.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Converts metrics to a JSON value.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "queued": self.queued(),
            "dropped": self.dropped(),
        })
    }
}

/// Hands events to a background worker that forwards them downstream.
///
/// `try_emit` never waits: when the bounded queue is full the event is
/// dropped and logged. Dropping the sink closes the queue and lets the worker
/// drain what is left.
pub struct QueuedEventSink {
    tx: mpsc::Sender<WorkflowEvent>,
    capacity: usize,
    metrics: Arc<DispatchMetrics>,
}

impl QueuedEventSink {
    /// Spawns the dispatch worker on the current tokio runtime.
    ///
    /// The returned handle resolves once every sender is gone and the queue
    /// is drained.
    #[must_use]
    pub fn spawn(downstream: Arc<dyn EventSink>, capacity: usize) -> (Arc<Self>, JoinHandle<()>) {
        let capacity = capacity.max(1);
        let (tx, mut rx) = mpsc::channel::<WorkflowEvent>(capacity);

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                downstream.emit(event).await;
            }
            debug!("Event dispatch queue closed");
        });

        let sink = Arc::new(Self {
            tx,
            capacity,
            metrics: Arc::new(DispatchMetrics::default()),
        });
        (sink, handle)
    }

    /// Returns the number of events waiting in the queue.
    #[must_use]
    pub fn queue_size(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    /// Returns the dispatch counters.
    #[must_use]
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for QueuedEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedEventSink")
            .field("capacity", &self.capacity)
            .field("queue_size", &self.queue_size())
            .field("metrics", &self.metrics)
            .finish()
    }
}

#[async_trait]
impl EventSink for QueuedEventSink {
    async fn emit(&self, event: WorkflowEvent) {
        let event_type = event.event_type();
        if self.tx.send(event).await.is_ok() {
            self.metrics.queued.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(event_type = %event_type, "Event dropped: dispatch worker stopped");
        }
    }

    fn try_emit(&self, event: WorkflowEvent) {
        let event_type = event.event_type();
        let instance_id = event.instance_id.clone();
        match self.tx.try_send(event) {
            Ok(()) => {
                self.metrics.queued.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    event_type = %event_type,
                    instance_id = %instance_id,
                    queue_size = self.queue_size(),
                    dropped_total = self.metrics.dropped(),
                    "Event dropped: {}", e
                );
            }
        }
    }
}
