//! Notification events emitted by the engine.

use crate::model::{Definition, Instance, Task};
use crate::utils::{format_iso8601, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowEventKind {
    /// An instance was started.
    #[serde(rename = "workflow.started")]
    Started,
    /// An instance entered a stage.
    #[serde(rename = "workflow.stage_entered")]
    StageEntered,
    /// A task was created for an assignee.
    #[serde(rename = "workflow.task_assigned")]
    TaskAssigned,
    /// An approver decided a task.
    #[serde(rename = "workflow.task_decided")]
    TaskDecided,
    /// A task was handed to another user.
    #[serde(rename = "workflow.task_delegated")]
    TaskDelegated,
    /// An instance completed.
    #[serde(rename = "workflow.completed")]
    Completed,
    /// An instance was rejected.
    #[serde(rename = "workflow.rejected")]
    Rejected,
    /// An instance was recalled by its initiator.
    #[serde(rename = "workflow.recalled")]
    Recalled,
}

impl WorkflowEventKind {
    /// Returns the dotted event type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "workflow.started",
            Self::StageEntered => "workflow.stage_entered",
            Self::TaskAssigned => "workflow.task_assigned",
            Self::TaskDecided => "workflow.task_decided",
            Self::TaskDelegated => "workflow.task_delegated",
            Self::Completed => "workflow.completed",
            Self::Rejected => "workflow.rejected",
            Self::Recalled => "workflow.recalled",
        }
    }
}

impl fmt::Display for WorkflowEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification about a committed workflow change.
///
/// Events carry who should hear about the change; delivering them is the
/// sink's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: WorkflowEventKind,
    /// Instance the event concerns.
    pub instance_id: String,
    /// Definition being executed.
    pub definition_id: String,
    /// Entity type.
    pub entity_type: String,
    /// Entity id.
    pub entity_id: String,
    /// Entity display label.
    pub entity_label: String,
    /// Stage involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<String>,
    /// Task involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// User who caused the change.
    pub actor: String,
    /// User ids or roles to notify.
    pub recipients: Vec<String>,
    /// When the change was committed.
    pub occurred_at: Timestamp,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl WorkflowEvent {
    /// Creates an event about `instance` with no recipients.
    #[must_use]
    pub fn new(
        kind: WorkflowEventKind,
        instance: &Instance,
        actor: impl Into<String>,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            kind,
            instance_id: instance.id.clone(),
            definition_id: instance.definition_id.clone(),
            entity_type: instance.entity_type.clone(),
            entity_id: instance.entity_id.clone(),
            entity_label: instance.entity_label.clone(),
            stage_id: instance.current_stage_id.clone(),
            task_id: None,
            actor: actor.into(),
            recipients: Vec::new(),
            occurred_at,
            data: serde_json::Map::new(),
        }
    }

    /// Workflow started; notifies the definition's start list.
    #[must_use]
    pub fn started(instance: &Instance, definition: &Definition, at: Timestamp) -> Self {
        Self::new(WorkflowEventKind::Started, instance, &instance.initiator, at)
            .with_stage(None)
            .with_recipients(definition.notify_on_start.iter().cloned())
            .with_data("definition_name", instance.definition_name.clone().into())
    }

    /// Stage entered; notifies every assignee of the stage's new tasks.
    #[must_use]
    pub fn stage_entered<'a>(
        instance: &Instance,
        tasks: impl IntoIterator<Item = &'a Task>,
        actor: &str,
        at: Timestamp,
    ) -> Self {
        let stage_name = instance.current_stage_name.clone().unwrap_or_default();
        Self::new(WorkflowEventKind::StageEntered, instance, actor, at)
            .with_recipients(tasks.into_iter().map(|t| t.assignee_id.clone()))
            .with_data("stage_name", stage_name.into())
    }

    /// Task created; notifies its assignee.
    #[must_use]
    pub fn task_assigned(instance: &Instance, task: &Task, actor: &str, at: Timestamp) -> Self {
        Self::new(WorkflowEventKind::TaskAssigned, instance, actor, at)
            .with_task(task)
            .with_recipients([task.assignee_id.clone()])
            .with_data("assignee_kind", task.assignee_kind.as_str().into())
            .with_data(
                "due_at",
                task.due_at
                    .map_or(serde_json::Value::Null, |d| format_iso8601(&d).into()),
            )
    }

    /// Task decided; notifies the initiator.
    #[must_use]
    pub fn task_decided(instance: &Instance, task: &Task, actor: &str, at: Timestamp) -> Self {
        Self::new(WorkflowEventKind::TaskDecided, instance, actor, at)
            .with_stage(Some(task.stage_id.clone()))
            .with_task(task)
            .with_recipients([instance.initiator.clone()])
            .with_data("decision", task.decision.as_str().into())
    }

    /// Task handed over; notifies the delegatee.
    #[must_use]
    pub fn task_delegated(
        instance: &Instance,
        original: &Task,
        delegated: &Task,
        actor: &str,
        at: Timestamp,
    ) -> Self {
        Self::new(WorkflowEventKind::TaskDelegated, instance, actor, at)
            .with_task(delegated)
            .with_recipients([delegated.assignee_id.clone()])
            .with_data("original_task_id", original.id.clone().into())
    }

    /// Workflow completed; notifies the initiator and the completion list.
    #[must_use]
    pub fn completed(instance: &Instance, definition: &Definition, actor: &str, at: Timestamp) -> Self {
        Self::new(WorkflowEventKind::Completed, instance, actor, at).with_recipients(
            std::iter::once(instance.initiator.clone())
                .chain(definition.notify_on_complete.iter().cloned()),
        )
    }

    /// Workflow rejected; notifies the initiator and the rejection list.
    #[must_use]
    pub fn rejected(instance: &Instance, definition: &Definition, actor: &str, at: Timestamp) -> Self {
        Self::new(WorkflowEventKind::Rejected, instance, actor, at)
            .with_recipients(
                std::iter::once(instance.initiator.clone())
                    .chain(definition.notify_on_reject.iter().cloned()),
            )
            .with_data("comment", instance.final_comment.clone().into())
    }

    /// Workflow recalled; notifies the assignees of the recalled tasks.
    #[must_use]
    pub fn recalled<'a>(
        instance: &Instance,
        recalled: impl IntoIterator<Item = &'a Task>,
        at: Timestamp,
    ) -> Self {
        Self::new(WorkflowEventKind::Recalled, instance, &instance.initiator, at)
            .with_recipients(recalled.into_iter().map(|t| t.assignee_id.clone()))
            .with_data("reason", instance.final_comment.clone().into())
    }

    /// Overrides the stage.
    #[must_use]
    pub fn with_stage(mut self, stage_id: Option<String>) -> Self {
        self.stage_id = stage_id;
        self
    }

    /// Sets the task and its stage.
    #[must_use]
    pub fn with_task(mut self, task: &Task) -> Self {
        self.task_id = Some(task.id.clone());
        self.stage_id = Some(task.stage_id.clone());
        self
    }

    /// Adds recipients, skipping duplicates.
    #[must_use]
    pub fn with_recipients<I>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        for recipient in recipients {
            if !self.recipients.contains(&recipient) {
                self.recipients.push(recipient);
            }
        }
        self
    }

    /// Adds a payload entry.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns the dotted event type.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Converts to a JSON value.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AssigneeKind, InstanceStatus};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn instance() -> Instance {
        Instance {
            id: "inst-1".to_string(),
            definition_id: "wf".to_string(),
            definition_name: "Workflow".to_string(),
            entity_type: "document".to_string(),
            entity_id: "doc-1".to_string(),
            entity_label: "DOC-1".to_string(),
            status: InstanceStatus::PendingApproval,
            current_stage_id: Some("s1".to_string()),
            current_stage_name: Some("Review".to_string()),
            tasks: Vec::new(),
            transitions: Vec::new(),
            initiator: "alice".to_string(),
            initiated_at: Utc::now(),
            completed_at: None,
            submission_comment: String::new(),
            final_comment: "not ready".to_string(),
            context: serde_json::Map::new(),
            version: 1,
        }
    }

    #[test]
    fn test_rejected_recipients_deduplicated() {
        let def = Definition::new("wf", "Workflow").notify_on_reject(["alice", "qa-lead"]);
        let event = WorkflowEvent::rejected(&instance(), &def, "bob", Utc::now());

        assert_eq!(event.event_type(), "workflow.rejected");
        assert_eq!(event.recipients, vec!["alice".to_string(), "qa-lead".to_string()]);
        assert_eq!(event.data["comment"], "not ready");
    }

    #[test]
    fn test_task_assigned_payload() {
        let inst = instance();
        let task = Task::pending("t1", "inst-1", "s1", "Review", "engineer", AssigneeKind::Role, Utc::now());
        let event = WorkflowEvent::task_assigned(&inst, &task, "alice", Utc::now());

        assert_eq!(event.task_id.as_deref(), Some("t1"));
        assert_eq!(event.recipients, vec!["engineer".to_string()]);
        assert_eq!(event.data["assignee_kind"], "role");
        assert!(event.data["due_at"].is_null());
    }

    #[test]
    fn test_to_value_uses_dotted_type() {
        let def = Definition::new("wf", "Workflow");
        let value = WorkflowEvent::started(&instance(), &def, Utc::now()).to_value();

        assert_eq!(value["type"], "workflow.started");
        assert_eq!(value["entity_label"], "DOC-1");
        assert!(value.get("stage_id").is_none());
    }
}
