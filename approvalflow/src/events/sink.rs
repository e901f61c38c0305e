//! Event sink trait and implementations.

use super::WorkflowEvent;
use async_trait::async_trait;
use tracing::{debug, info, Level};

/// Receives workflow notifications.
///
/// The engine calls [`EventSink::try_emit`] after a change has been committed.
/// Sinks own delivery: a failure must be logged, never surfaced to the engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: WorkflowEvent);

    /// Tries to emit an event without blocking.
    ///
    /// This method must never panic. Errors are logged but suppressed.
    fn try_emit(&self, event: WorkflowEvent);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: WorkflowEvent) {}

    fn try_emit(&self, _event: WorkflowEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &WorkflowEvent) {
        let recipients = event.recipients.join(",");
        if self.level == Level::DEBUG {
            debug!(
                event_type = %event.kind,
                instance_id = %event.instance_id,
                recipients = %recipients,
                event_data = ?event.data,
                "Event: {} for {}", event.kind, event.entity_label
            );
        } else {
            info!(
                event_type = %event.kind,
                instance_id = %event.instance_id,
                recipients = %recipients,
                "Event: {} for {}", event.kind, event.entity_label
            );
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: WorkflowEvent) {
        self.log_event(&event);
    }

    fn try_emit(&self, event: WorkflowEvent) {
        self.log_event(&event);
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<WorkflowEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.read().clone()
    }

    /// Returns the dotted types of the collected events, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.read().iter().map(WorkflowEvent::event_type).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events whose type starts with `type_prefix`.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<WorkflowEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type().starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: WorkflowEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: WorkflowEvent) {
        self.events.write().push(event);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::events::WorkflowEventKind;
    use chrono::Utc;

    pub(crate) fn event(kind: WorkflowEventKind) -> WorkflowEvent {
        WorkflowEvent {
            kind,
            instance_id: "inst-1".to_string(),
            definition_id: "wf".to_string(),
            entity_type: "part".to_string(),
            entity_id: "p-1".to_string(),
            entity_label: "PN-1".to_string(),
            stage_id: None,
            task_id: None,
            actor: "alice".to_string(),
            recipients: vec!["bob".to_string()],
            occurred_at: Utc::now(),
            data: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit(event(WorkflowEventKind::Started)).await;
        sink.try_emit(event(WorkflowEventKind::Completed));
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink::default();
        sink.emit(event(WorkflowEventKind::Started)).await;
        LoggingEventSink::debug().try_emit(event(WorkflowEventKind::Rejected));
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(event(WorkflowEventKind::Started)).await;
        sink.try_emit(event(WorkflowEventKind::TaskAssigned));

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.event_types(),
            vec!["workflow.started", "workflow.task_assigned"]
        );
    }

    #[tokio::test]
    async fn test_collecting_sink_filter_and_clear() {
        let sink = CollectingEventSink::new();
        sink.try_emit(event(WorkflowEventKind::TaskAssigned));
        sink.try_emit(event(WorkflowEventKind::TaskDecided));
        sink.try_emit(event(WorkflowEventKind::Completed));

        assert_eq!(sink.events_of_type("workflow.task_").len(), 2);

        sink.clear();
        assert!(sink.is_empty());
    }
}
