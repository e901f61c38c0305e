//! The workflow engine.
//!
//! [`WorkflowEngine`] drives instances through their definition's stages.
//! Every mutating call is a short read-modify-write against one instance:
//! load it, apply the change to a private copy, commit with the version that
//! was loaded, then publish notifications. A concurrent writer makes the
//! commit fail with [`WorkflowError::ConcurrencyConflict`]; the engine never
//! retries.

mod assignment;
mod change;
mod evaluation;
mod requests;


pub use assignment::{resolve_assignments, Assignment};
pub use evaluation::{evaluate_stage, StageVerdict};
pub use requests::{DecideRequest, DelegateRequest, EscalationCandidate, StartRequest};

use crate::config::EngineConfig;
use crate::core::InstanceStatus;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::events::{EventSink, NoOpEventSink, WorkflowEvent};
use crate::model::{Definition, Instance, Task};
use crate::observability::operation_span;
use crate::registry::{builtin_definitions, DefinitionRegistry};
use crate::store::{InMemoryInstanceStore, InstanceFilter, InstanceStore};
use crate::utils::{generate_id, Clock, SystemClock, Timestamp};
use change::Change;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

/// Multi-stage approval workflow engine.
pub struct WorkflowEngine {
    registry: Arc<DefinitionRegistry>,
    store: Arc<dyn InstanceStore>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Creates an engine with the built-in definitions, an in-memory store,
    /// no notifications and the system clock.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            registry: Arc::new(DefinitionRegistry::with_builtins()),
            store: Arc::new(InMemoryInstanceStore::new()),
            sink: Arc::new(NoOpEventSink),
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
        }
    }

    /// Returns the definition registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<DefinitionRegistry> {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- Operations ----

    /// Starts a workflow and enters its first stage.
    pub fn start(&self, request: StartRequest) -> WorkflowResult<Instance> {
        let definition = self
            .registry
            .get(&request.definition_id)
            .ok_or_else(|| WorkflowError::definition_not_found(&request.definition_id))?;

        let now = self.clock.now();
        let instance = Instance {
            id: generate_id(),
            definition_id: definition.id.clone(),
            definition_name: definition.name.clone(),
            entity_type: request.entity_type,
            entity_id: request.entity_id,
            entity_label: request.entity_label,
            status: InstanceStatus::Draft,
            current_stage_id: None,
            current_stage_name: None,
            tasks: Vec::new(),
            transitions: Vec::new(),
            initiator: request.initiator,
            initiated_at: now,
            completed_at: None,
            submission_comment: request.comment,
            final_comment: String::new(),
            context: request.context,
            version: 0,
        };

        let _span = operation_span("start", &instance.id).entered();
        let mut change = Change::new(instance, &definition, now, self.config.count_delegated_in_tally);
        change.start();
        let (instance, events) = change.finish();

        let stored = self.store.insert(instance)?;
        self.publish(events);
        Ok(stored)
    }

    /// Records a decision and advances the workflow if the stage is satisfied.
    pub fn decide(&self, request: DecideRequest) -> WorkflowResult<Instance> {
        if !request.decision.is_user_decision() {
            return Err(WorkflowError::InvalidDecision {
                decision: request.decision,
            });
        }

        let _span = operation_span("decide", &request.instance_id).entered();
        let (instance, definition) = self.load(&request.instance_id)?;
        Self::check_task_actionable(&instance, &request.task_id)?;

        let expected = instance.version;
        let mut change = Change::new(
            instance,
            &definition,
            self.clock.now(),
            self.config.count_delegated_in_tally,
        );
        change.decide(&request)?;
        change.evaluate(&request.decider_id)?;
        let (instance, events) = change.finish();

        let stored = self.store.update(instance, expected)?;
        self.publish(events);
        Ok(stored)
    }

    /// Hands a pending task to another user and returns the new task.
    ///
    /// Delegation does not evaluate the stage.
    pub fn delegate(&self, request: DelegateRequest) -> WorkflowResult<Task> {
        let _span = operation_span("delegate", &request.instance_id).entered();
        let (instance, definition) = self.load(&request.instance_id)?;
        Self::check_task_actionable(&instance, &request.task_id)?;

        let expected = instance.version;
        let mut change = Change::new(
            instance,
            &definition,
            self.clock.now(),
            self.config.count_delegated_in_tally,
        );
        let delegated = change.delegate(&request)?;
        let (instance, events) = change.finish();

        self.store.update(instance, expected)?;
        self.publish(events);
        Ok(delegated)
    }

    /// Cancels an in-flight workflow on behalf of its initiator.
    pub fn recall(&self, instance_id: &str, user_id: &str, reason: &str) -> WorkflowResult<Instance> {
        let _span = operation_span("recall", instance_id).entered();
        let (instance, definition) = self.load(instance_id)?;

        if instance.initiator != user_id {
            return Err(WorkflowError::UnauthorizedRecall {
                instance_id: instance.id,
                user_id: user_id.to_string(),
            });
        }
        if !instance.status.is_in_progress() {
            return Err(WorkflowError::InvalidRecallState {
                instance_id: instance.id,
                status: instance.status,
            });
        }

        let expected = instance.version;
        let mut change = Change::new(
            instance,
            &definition,
            self.clock.now(),
            self.config.count_delegated_in_tally,
        );
        change.recall(user_id, reason);
        let (instance, events) = change.finish();

        let stored = self.store.update(instance, expected)?;
        self.publish(events);
        Ok(stored)
    }

    // ---- Queries ----

    /// Gets an instance by id.
    pub fn get_instance(&self, instance_id: &str) -> WorkflowResult<Instance> {
        self.store
            .get(instance_id)?
            .ok_or_else(|| WorkflowError::instance_not_found(instance_id))
    }

    /// Lists the actionable tasks assigned directly to `user_id`.
    pub fn tasks_for_user(&self, user_id: &str) -> WorkflowResult<Vec<Task>> {
        self.actionable_tasks(|t| t.is_assigned_to_user(user_id))
    }

    /// Lists the actionable tasks assigned to `role`.
    pub fn tasks_for_role(&self, role: &str) -> WorkflowResult<Vec<Task>> {
        self.actionable_tasks(|t| t.is_assigned_to_role(role))
    }

    /// Lists every instance started for one entity, oldest first.
    pub fn instances_for_entity(&self, entity_type: &str, entity_id: &str) -> WorkflowResult<Vec<Instance>> {
        Ok(self
            .store
            .find(&InstanceFilter::for_entity(entity_type, entity_id))?)
    }

    /// Lists the instances that are active or pending approval.
    pub fn active_instances(&self) -> WorkflowResult<Vec<Instance>> {
        Ok(self.store.find(&InstanceFilter::in_progress())?)
    }

    /// Lists actionable tasks that are past their due date at `now`.
    pub fn overdue_tasks(&self, now: Timestamp) -> WorkflowResult<Vec<Task>> {
        self.actionable_tasks(|t| t.is_overdue(now))
    }

    /// Lists actionable tasks whose stage escalation window has passed at `now`.
    ///
    /// The engine does not act on these; an external scheduler decides
    /// whether to delegate or notify.
    pub fn escalation_candidates(&self, now: Timestamp) -> WorkflowResult<Vec<EscalationCandidate>> {
        let mut candidates = Vec::new();
        for instance in self.store.find(&InstanceFilter::in_progress())? {
            let Some(definition) = self.registry.get(&instance.definition_id) else {
                continue;
            };
            for task in instance.actionable_tasks() {
                let Some(stage) = definition.stage(&task.stage_id) else {
                    continue;
                };
                let escalate_after = task.created_at + Duration::days(i64::from(stage.escalation_days));
                if now > escalate_after {
                    candidates.push(EscalationCandidate {
                        task: task.clone(),
                        escalate_after,
                        escalate_to: stage.escalate_to.clone(),
                    });
                }
            }
        }
        Ok(candidates)
    }

    /// Gets a definition by id.
    #[must_use]
    pub fn get_definition(&self, definition_id: &str) -> Option<Arc<Definition>> {
        self.registry.get(definition_id)
    }

    /// Lists every registered definition.
    #[must_use]
    pub fn list_definitions(&self) -> Vec<Arc<Definition>> {
        self.registry.list()
    }

    /// Lists the active definitions for an entity type.
    #[must_use]
    pub fn definitions_for_entity(&self, entity_type: &str) -> Vec<Arc<Definition>> {
        self.registry.list_for_entity_type(entity_type)
    }

    /// Validates and registers a definition.
    ///
    /// Duplicate stage ids or sequences, blank ids and ids that are already
    /// registered are always refused. With `strict_definitions`, definitions
    /// without stages or with approver-less stages are refused as well.
    pub fn register_definition(&self, definition: Definition) -> WorkflowResult<Arc<Definition>> {
        self.registry
            .register_with(definition, self.config.strict_definitions)
    }

    // ---- Internals ----

    fn load(&self, instance_id: &str) -> WorkflowResult<(Instance, Arc<Definition>)> {
        let instance = self.get_instance(instance_id)?;
        let definition = self
            .registry
            .get(&instance.definition_id)
            .ok_or_else(|| WorkflowError::definition_not_found(&instance.definition_id))?;
        Ok((instance, definition))
    }

    fn check_task_actionable(instance: &Instance, task_id: &str) -> WorkflowResult<()> {
        let task = instance
            .task(task_id)
            .ok_or_else(|| WorkflowError::task_not_found(&instance.id, task_id))?;

        if task.is_complete() {
            return Err(WorkflowError::TaskAlreadyDecided {
                task_id: task.id.clone(),
                decision: task.decision,
            });
        }
        if instance.status.is_terminal() {
            return Err(WorkflowError::InstanceTerminal {
                instance_id: instance.id.clone(),
                status: instance.status,
            });
        }
        if instance.current_stage_id.as_deref() != Some(task.stage_id.as_str()) {
            return Err(WorkflowError::TaskNotInCurrentStage {
                task_id: task.id.clone(),
                stage_id: task.stage_id.clone(),
            });
        }
        Ok(())
    }

    fn actionable_tasks<F>(&self, mut predicate: F) -> WorkflowResult<Vec<Task>>
    where
        F: FnMut(&Task) -> bool,
    {
        Ok(self
            .store
            .find(&InstanceFilter::in_progress())?
            .iter()
            .flat_map(Instance::actionable_tasks)
            .filter(|t| predicate(t))
            .cloned()
            .collect())
    }

    fn publish(&self, events: Vec<WorkflowEvent>) {
        if !self.config.emit_events {
            return;
        }
        debug!(count = events.len(), "Publishing workflow events");
        for event in events {
            self.sink.try_emit(event);
        }
    }
}

/// Builder for [`WorkflowEngine`].
#[derive(Default)]
pub struct EngineBuilder {
    registry: Option<Arc<DefinitionRegistry>>,
    store: Option<Arc<dyn InstanceStore>>,
    sink: Option<Arc<dyn EventSink>>,
    clock: Option<Arc<dyn Clock>>,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Uses an existing registry.
    #[must_use]
    pub fn registry(mut self, registry: Arc<DefinitionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the instance store. Defaults to an in-memory store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn InstanceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the event sink. Defaults to discarding events.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the clock. Defaults to the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the engine, registering built-ins and loading the
    /// definitions directory as configured.
    pub fn build(self) -> WorkflowResult<WorkflowEngine> {
        let registry = self.registry.unwrap_or_default();

        if self.config.load_builtins {
            for definition in builtin_definitions() {
                if !registry.contains(&definition.id) {
                    registry.register(definition)?;
                }
            }
        }
        if let Some(dir) = &self.config.definitions_dir {
            registry.load_json_dir(dir, self.config.strict_definitions)?;
        }

        info!(definitions = registry.len(), "Workflow engine ready");
        Ok(WorkflowEngine {
            registry,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryInstanceStore::new())),
            sink: self.sink.unwrap_or_else(|| Arc::new(NoOpEventSink)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            config: self.config,
        })
    }
}
