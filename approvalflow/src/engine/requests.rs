//! Inputs to engine operations.

use crate::core::Decision;
use crate::model::Task;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};

/// Starts a workflow for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    /// Definition to execute.
    pub definition_id: String,
    /// Entity type (e.g. "change-order").
    pub entity_type: String,
    /// Entity id.
    pub entity_id: String,
    /// Entity display label.
    pub entity_label: String,
    /// User starting the workflow.
    pub initiator: String,
    /// Submission comment.
    #[serde(default)]
    pub comment: String,
    /// Opaque caller data stored on the instance.
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl StartRequest {
    /// Creates a request with no comment or context.
    #[must_use]
    pub fn new(
        definition_id: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        entity_label: impl Into<String>,
        initiator: impl Into<String>,
    ) -> Self {
        Self {
            definition_id: definition_id.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            entity_label: entity_label.into(),
            initiator: initiator.into(),
            comment: String::new(),
            context: serde_json::Map::new(),
        }
    }

    /// Sets the submission comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Adds a context entry.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

/// Records an approver's decision on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecideRequest {
    /// Owning instance.
    pub instance_id: String,
    /// Task being decided.
    pub task_id: String,
    /// The decision.
    pub decision: Decision,
    /// User deciding.
    pub decider_id: String,
    /// Decision comments.
    #[serde(default)]
    pub comment: String,
    /// Conditions of a conditional approval.
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl DecideRequest {
    /// Creates a request with no comment or conditions.
    #[must_use]
    pub fn new(
        instance_id: impl Into<String>,
        task_id: impl Into<String>,
        decision: Decision,
        decider_id: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            task_id: task_id.into(),
            decision,
            decider_id: decider_id.into(),
            comment: String::new(),
            conditions: Vec::new(),
        }
    }

    /// Approves the task.
    #[must_use]
    pub fn approve(
        instance_id: impl Into<String>,
        task_id: impl Into<String>,
        decider_id: impl Into<String>,
    ) -> Self {
        Self::new(instance_id, task_id, Decision::Approved, decider_id)
    }

    /// Rejects the task with a comment.
    #[must_use]
    pub fn reject(
        instance_id: impl Into<String>,
        task_id: impl Into<String>,
        decider_id: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self::new(instance_id, task_id, Decision::Rejected, decider_id).with_comment(comment)
    }

    /// Sets the comments.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the approval conditions.
    #[must_use]
    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = conditions.into_iter().map(Into::into).collect();
        self
    }
}

/// Hands a pending task to another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateRequest {
    /// Owning instance.
    pub instance_id: String,
    /// Task being handed over.
    pub task_id: String,
    /// User handing the task over.
    pub from_user: String,
    /// User receiving the task.
    pub to_user: String,
    /// Display label of the receiving user; defaults to the id.
    #[serde(default)]
    pub to_user_label: String,
    /// Delegation comments.
    #[serde(default)]
    pub comment: String,
}

impl DelegateRequest {
    /// Creates a request with no label or comment.
    #[must_use]
    pub fn new(
        instance_id: impl Into<String>,
        task_id: impl Into<String>,
        from_user: impl Into<String>,
        to_user: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            task_id: task_id.into(),
            from_user: from_user.into(),
            to_user: to_user.into(),
            to_user_label: String::new(),
            comment: String::new(),
        }
    }

    /// Sets the receiving user's display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.to_user_label = label.into();
        self
    }

    /// Sets the comments.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// A pending task whose escalation window has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscalationCandidate {
    /// The task.
    pub task: Task,
    /// When the task became eligible for escalation.
    pub escalate_after: Timestamp,
    /// Role or user the stage escalates to, if configured.
    pub escalate_to: Option<String>,
}
