//! Workflow notifications.
//!
//! The engine describes every committed change as a [`WorkflowEvent`] and
//! hands it to an [`EventSink`]. Delivery (mail, chat, webhooks) lives behind
//! the sink; the engine never waits on it and never sees its failures.

mod event;
mod queue;
mod sink;

pub use event::{WorkflowEvent, WorkflowEventKind};
pub use queue::{DispatchMetrics, QueuedEventSink};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

#[cfg(test)]
pub use sink::MockEventSink;
