//! # Approvalflow
//!
//! A multi-stage approval workflow engine for business entities such as
//! change orders, controlled documents and part releases.
//!
//! Approvalflow provides:
//!
//! - **Definitions**: reusable templates of ordered stages, each with its own
//!   approvers and aggregation policy (`all`, `any`, `majority`, `first`)
//! - **Instances**: one run of a definition against one entity, with an
//!   append-only transition log that replays to the current status
//! - **Delegation and recall**: tasks can be handed over, and initiators can
//!   cancel an in-flight workflow
//! - **Notifications**: workflow events handed to a pluggable sink after
//!   every committed change
//!
//! ## Quick Start
//!
//! ```rust
//! use approvalflow::prelude::*;
//!
//! let engine = WorkflowEngine::in_memory();
//! let instance = engine
//!     .start(StartRequest::new(
//!         DOCUMENT_REVIEW_DEFINITION_ID,
//!         "document",
//!         "doc-7",
//!         "DOC-0007",
//!         "alice",
//!     ))
//!     .unwrap();
//!
//! assert_eq!(instance.status, InstanceStatus::PendingApproval);
//! assert_eq!(engine.tasks_for_role("engineer").unwrap().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod events;
pub mod model;
pub mod observability;
pub mod registry;
pub mod store;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::{
        Aggregation, AssigneeKind, Decision, InstanceStatus, StageKind, TriggerKind,
    };
    pub use crate::engine::{
        DecideRequest, DelegateRequest, EngineBuilder, EscalationCandidate, StartRequest,
        WorkflowEngine,
    };
    pub use crate::errors::{WorkflowError, WorkflowResult};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, QueuedEventSink,
        WorkflowEvent, WorkflowEventKind,
    };
    pub use crate::model::{Definition, Instance, Stage, Task, Transition};
    pub use crate::registry::{
        DefinitionRegistry, CHANGE_ORDER_DEFINITION_ID, DOCUMENT_REVIEW_DEFINITION_ID,
        PART_RELEASE_DEFINITION_ID,
    };
    pub use crate::store::{InMemoryInstanceStore, InstanceFilter, InstanceStore};
    pub use crate::utils::{Clock, ManualClock, SystemClock};
}
