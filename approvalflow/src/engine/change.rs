//! In-flight mutation of one instance.
//!
//! A [`Change`] owns a private copy of the instance. Operations mutate the
//! copy and queue the matching events; the engine commits the copy and only
//! then publishes the events.

use super::assignment::resolve_assignments;
use super::evaluation::{evaluate_stage, StageVerdict};
use super::requests::{DecideRequest, DelegateRequest};
use crate::core::{AssigneeKind, Decision, InstanceStatus, TriggerKind};
use crate::errors::{WorkflowError, WorkflowResult};
use crate::events::WorkflowEvent;
use crate::model::{Definition, Instance, Stage, Task, Transition};
use crate::utils::{generate_id, Timestamp};
use chrono::Duration;
use tracing::{debug, info, warn};

pub(crate) struct Change<'a> {
    instance: Instance,
    definition: &'a Definition,
    now: Timestamp,
    count_delegated: bool,
    events: Vec<WorkflowEvent>,
}

impl<'a> Change<'a> {
    pub(crate) fn new(
        instance: Instance,
        definition: &'a Definition,
        now: Timestamp,
        count_delegated: bool,
    ) -> Self {
        Self {
            instance,
            definition,
            now,
            count_delegated,
            events: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> (Instance, Vec<WorkflowEvent>) {
        (self.instance, self.events)
    }

    /// Moves a draft instance to `active` and enters the first stage.
    pub(crate) fn start(&mut self) {
        let initiator = self.instance.initiator.clone();
        let transition = Transition::new(
            &self.instance.id,
            TriggerKind::Initiation,
            &initiator,
            self.now,
        )
        .with_comments(self.instance.submission_comment.clone());
        self.instance.change_status(InstanceStatus::Active, transition);

        info!(
            instance_id = %self.instance.id,
            definition_id = %self.definition.id,
            "Started workflow {} for {}",
            self.definition.name,
            self.instance.entity_label
        );
        self.events
            .push(WorkflowEvent::started(&self.instance, self.definition, self.now));

        let definition = self.definition;
        match definition.first_stage() {
            Some(stage) => self.enter_stage(stage, &initiator),
            None => warn!(
                instance_id = %self.instance.id,
                definition_id = %definition.id,
                "Workflow definition has no stages; instance stays active"
            ),
        }
    }

    fn enter_stage(&mut self, stage: &Stage, actor: &str) {
        let from_stage = self.instance.current_stage_id.replace(stage.id.clone());
        self.instance.current_stage_name = Some(stage.name.clone());

        let assignments = resolve_assignments(stage);
        if assignments.is_empty() {
            warn!(
                instance_id = %self.instance.id,
                stage_id = %stage.id,
                "Stage has no approvers; it can never complete"
            );
        }

        let due_at = self.now + Duration::days(i64::from(stage.due_days));
        let tasks: Vec<Task> = assignments
            .into_iter()
            .map(|a| {
                Task::pending(
                    generate_id(),
                    &self.instance.id,
                    &stage.id,
                    &stage.name,
                    a.assignee_id,
                    a.assignee_kind,
                    self.now,
                )
                .with_due_at(Some(due_at))
            })
            .collect();

        let transition = Transition::new(&self.instance.id, TriggerKind::StageAdvance, actor, self.now)
            .with_stages(from_stage, Some(stage.id.clone()));
        if self.instance.status == InstanceStatus::PendingApproval {
            self.instance.record(transition);
        } else {
            self.instance
                .change_status(InstanceStatus::PendingApproval, transition);
        }

        info!(
            instance_id = %self.instance.id,
            stage_id = %stage.id,
            tasks = tasks.len(),
            "Entered stage {}",
            stage.name
        );

        self.events.push(WorkflowEvent::stage_entered(
            &self.instance,
            &tasks,
            actor,
            self.now,
        ));
        for task in &tasks {
            self.events
                .push(WorkflowEvent::task_assigned(&self.instance, task, actor, self.now));
        }
        self.instance.tasks.extend(tasks);
    }

    /// Stamps a decision on a pending task of the current stage.
    pub(crate) fn decide(&mut self, request: &DecideRequest) -> WorkflowResult<()> {
        let now = self.now;
        let task = self
            .instance
            .task_mut(&request.task_id)
            .ok_or_else(|| WorkflowError::task_not_found(&request.instance_id, &request.task_id))?;

        task.decision = request.decision;
        task.decision_at = Some(now);
        task.completed_at = Some(now);
        task.comments.clone_from(&request.comment);
        task.conditions.clone_from(&request.conditions);
        let task = task.clone();

        debug!(
            instance_id = %self.instance.id,
            task_id = %task.id,
            decision = %task.decision,
            "Task decided by {}",
            request.decider_id
        );

        let stage = Some(task.stage_id.clone());
        let transition = Transition::new(
            &self.instance.id,
            TriggerKind::Decision,
            &request.decider_id,
            now,
        )
        .with_stages(stage.clone(), stage)
        .with_task(&task.id, task.decision)
        .with_comments(request.comment.clone());
        self.instance.record(transition);
        self.events.push(WorkflowEvent::task_decided(
            &self.instance,
            &task,
            &request.decider_id,
            now,
        ));
        Ok(())
    }

    /// Hands a pending task to another user and returns the new task.
    pub(crate) fn delegate(&mut self, request: &DelegateRequest) -> WorkflowResult<Task> {
        let now = self.now;
        let original = self
            .instance
            .task_mut(&request.task_id)
            .ok_or_else(|| WorkflowError::task_not_found(&request.instance_id, &request.task_id))?;

        original.decision = Decision::Delegated;
        original.completed_at = Some(now);
        original.delegated_to = Some(request.to_user.clone());
        original.comments.clone_from(&request.comment);
        let original = original.clone();

        let label = if request.to_user_label.is_empty() {
            request.to_user.clone()
        } else {
            request.to_user_label.clone()
        };
        let mut delegated = Task::pending(
            generate_id(),
            &self.instance.id,
            &original.stage_id,
            &original.stage_name,
            &request.to_user,
            AssigneeKind::User,
            now,
        )
        .with_due_at(original.due_at)
        .with_assignee_label(label);
        delegated.delegated_from = Some(request.from_user.clone());

        debug!(
            instance_id = %self.instance.id,
            task_id = %original.id,
            new_task_id = %delegated.id,
            "Task delegated from {} to {}",
            request.from_user,
            request.to_user
        );

        let stage = Some(original.stage_id.clone());
        let transition = Transition::new(
            &self.instance.id,
            TriggerKind::Delegation,
            &request.from_user,
            now,
        )
        .with_stages(stage.clone(), stage)
        .with_task(&original.id, Decision::Delegated)
        .with_comments(request.comment.clone());
        self.instance.record(transition);
        self.instance.tasks.push(delegated.clone());

        self.events.push(WorkflowEvent::task_delegated(
            &self.instance,
            &original,
            &delegated,
            &request.from_user,
            now,
        ));
        Ok(delegated)
    }

    /// Applies the current stage's verdict: reject, advance, complete or wait.
    pub(crate) fn evaluate(&mut self, actor: &str) -> WorkflowResult<()> {
        let definition = self.definition;
        let Some(stage_id) = self.instance.current_stage_id.clone() else {
            return Ok(());
        };
        let stage = definition
            .stage(&stage_id)
            .ok_or_else(|| WorkflowError::InvalidDefinition {
                definition_id: definition.id.clone(),
                problems: vec![format!("stage '{stage_id}' no longer exists")],
            })?;

        match evaluate_stage(stage, &self.instance.tasks, self.count_delegated) {
            StageVerdict::Rejected { task_id, comments } => self.reject(actor, &task_id, comments),
            StageVerdict::Complete => match definition.next_stage(&stage_id) {
                Some(next) => self.enter_stage(next, actor),
                None => self.complete(actor),
            },
            StageVerdict::Waiting => {}
        }
        Ok(())
    }

    fn reject(&mut self, actor: &str, task_id: &str, comments: String) {
        self.instance.final_comment.clone_from(&comments);
        self.instance.completed_at = Some(self.now);

        let stage = self.instance.current_stage_id.clone();
        let transition = Transition::new(&self.instance.id, TriggerKind::Rejection, actor, self.now)
            .with_stages(stage.clone(), stage)
            .with_task(task_id, Decision::Rejected)
            .with_comments(comments);
        self.instance
            .change_status(InstanceStatus::Rejected, transition);

        info!(
            instance_id = %self.instance.id,
            task_id = %task_id,
            "Workflow rejected for {}",
            self.instance.entity_label
        );
        self.events.push(WorkflowEvent::rejected(
            &self.instance,
            self.definition,
            actor,
            self.now,
        ));
    }

    fn complete(&mut self, actor: &str) {
        self.instance.completed_at = Some(self.now);

        let transition = Transition::new(&self.instance.id, TriggerKind::Completion, actor, self.now)
            .with_stages(self.instance.current_stage_id.clone(), None);
        self.instance
            .change_status(InstanceStatus::Completed, transition);

        info!(
            instance_id = %self.instance.id,
            "Workflow completed for {}",
            self.instance.entity_label
        );
        self.events.push(WorkflowEvent::completed(
            &self.instance,
            self.definition,
            actor,
            self.now,
        ));
    }

    /// Cancels the instance, recalling every pending task.
    pub(crate) fn recall(&mut self, user_id: &str, reason: &str) {
        let now = self.now;
        let mut recalled = Vec::new();
        for task in self.instance.tasks.iter_mut().filter(|t| !t.is_complete()) {
            task.decision = Decision::Recalled;
            task.completed_at = Some(now);
            recalled.push(task.clone());
        }

        self.instance.final_comment = reason.to_string();
        self.instance.completed_at = Some(now);

        let stage = self.instance.current_stage_id.clone();
        let transition = Transition::new(&self.instance.id, TriggerKind::Recall, user_id, now)
            .with_stages(stage.clone(), stage)
            .with_comments(reason);
        self.instance
            .change_status(InstanceStatus::Cancelled, transition);

        info!(
            instance_id = %self.instance.id,
            recalled_tasks = recalled.len(),
            "Workflow recalled by {}",
            user_id
        );
        self.events
            .push(WorkflowEvent::recalled(&self.instance, &recalled, now));
    }
}
