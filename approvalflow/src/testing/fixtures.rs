//! Test fixtures for workflow testing.

use crate::config::EngineConfig;
use crate::core::{Aggregation, Decision, InstanceStatus};
use crate::engine::{DecideRequest, StartRequest, WorkflowEngine};
use crate::errors::WorkflowResult;
use crate::events::CollectingEventSink;
use crate::model::{Definition, Instance, Stage};
use crate::registry::DefinitionRegistry;
use crate::utils::{ManualClock, Timestamp};
use chrono::{TimeZone, Utc};
use std::sync::Arc;

/// Entity type used by the fixture definitions.
pub const TEST_ENTITY_TYPE: &str = "widget";

/// Returns a draft instance with no tasks or transitions.
#[must_use]
pub fn draft_instance(id: &str, entity_type: &str, entity_id: &str) -> Instance {
    Instance {
        id: id.to_string(),
        definition_id: "wf-test".to_string(),
        definition_name: "Test Workflow".to_string(),
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        entity_label: entity_id.to_uppercase(),
        status: InstanceStatus::Draft,
        current_stage_id: None,
        current_stage_name: None,
        tasks: Vec::new(),
        transitions: Vec::new(),
        initiator: "initiator".to_string(),
        initiated_at: epoch(),
        completed_at: None,
        submission_comment: String::new(),
        final_comment: String::new(),
        context: serde_json::Map::new(),
        version: 0,
    }
}

/// A definition with one stage assigned to `users`.
#[must_use]
pub fn single_stage_definition(id: &str, aggregation: Aggregation, users: &[&str]) -> Definition {
    Definition::new(id, format!("{id} workflow"))
        .with_entity_types([TEST_ENTITY_TYPE])
        .with_stage(
            Stage::new("review", "Review", 1)
                .with_aggregation(aggregation)
                .with_users(users.iter().copied())
                .with_due_days(2),
        )
}

/// A definition with an `any` stage for two users followed by an `all`
/// stage for one user.
#[must_use]
pub fn two_stage_definition(id: &str) -> Definition {
    Definition::new(id, format!("{id} workflow"))
        .with_entity_types([TEST_ENTITY_TYPE])
        .with_stage(
            Stage::new("triage", "Triage", 1)
                .with_aggregation(Aggregation::Any)
                .with_users(["ann", "ben"])
                .with_escalation(1, "triage_lead"),
        )
        .with_stage(
            Stage::new("signoff", "Sign-off", 2)
                .with_aggregation(Aggregation::All)
                .with_users(["cara"]),
        )
        .notify_on_complete(["records"])
}

/// The fixed start time of a [`TestEngine`] clock.
#[must_use]
pub fn epoch() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

/// An engine over an in-memory store with a manual clock and a collecting sink.
#[derive(Debug)]
pub struct TestEngine {
    /// The engine under test.
    pub engine: WorkflowEngine,
    /// The engine's clock, starting at [`epoch`].
    pub clock: Arc<ManualClock>,
    /// Every event the engine published.
    pub sink: Arc<CollectingEventSink>,
}

impl TestEngine {
    /// Creates a harness with no registered definitions.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::new())
    }

    /// Creates a harness with `config`; built-ins are never loaded.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let clock = Arc::new(ManualClock::new(epoch()));
        let sink = Arc::new(CollectingEventSink::new());
        let engine = WorkflowEngine::builder()
            .registry(Arc::new(DefinitionRegistry::new()))
            .clock(clock.clone())
            .sink(sink.clone())
            .config(config.with_load_builtins(false))
            .build()
            .unwrap_or_else(|e| panic!("test engine failed to build: {e}"));
        Self {
            engine,
            clock,
            sink,
        }
    }

    /// Registers a definition, panicking if it is invalid.
    #[must_use]
    pub fn with_definition(self, definition: Definition) -> Self {
        if let Err(e) = self.engine.register_definition(definition) {
            panic!("fixture definition rejected: {e}");
        }
        self
    }

    /// Starts `definition_id` for a fresh widget on behalf of `initiator`.
    pub fn start(&self, definition_id: &str, initiator: &str) -> WorkflowResult<Instance> {
        self.engine.start(StartRequest::new(
            definition_id,
            TEST_ENTITY_TYPE,
            crate::utils::generate_id(),
            "WIDGET",
            initiator,
        ))
    }

    /// Returns the id of the actionable task assigned to `assignee`.
    ///
    /// Panics if there is none.
    #[must_use]
    pub fn task_id(&self, instance: &Instance, assignee: &str) -> String {
        instance
            .actionable_tasks()
            .find(|t| t.assignee_id == assignee)
            .map(|t| t.id.clone())
            .unwrap_or_else(|| panic!("no actionable task for {assignee}"))
    }

    /// Records `decision` by `assignee` on their actionable task.
    pub fn decide_as(
        &self,
        instance: &Instance,
        assignee: &str,
        decision: Decision,
    ) -> WorkflowResult<Instance> {
        let task_id = self.task_id(instance, assignee);
        self.engine
            .decide(DecideRequest::new(&instance.id, task_id, decision, assignee))
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}
