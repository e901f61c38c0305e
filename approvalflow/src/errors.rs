//! Error types for the approval workflow engine.
//!
//! Every error is surfaced synchronously to the caller. None of them is
//! retried inside the engine: they indicate a programming, authorization or
//! configuration problem at the call site.

use crate::core::{Decision, InstanceStatus};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for engine operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No definition is registered under the id.
    #[error("Workflow definition not found: {definition_id}")]
    DefinitionNotFound {
        /// The requested definition id.
        definition_id: String,
    },

    /// No instance is stored under the id.
    #[error("Workflow instance not found: {instance_id}")]
    InstanceNotFound {
        /// The requested instance id.
        instance_id: String,
    },

    /// The instance has no task with the id.
    #[error("Task not found: {task_id} (instance {instance_id})")]
    TaskNotFound {
        /// The owning instance.
        instance_id: String,
        /// The requested task id.
        task_id: String,
    },

    /// The task already holds a decision.
    #[error("Task already decided: {task_id} ({decision})")]
    TaskAlreadyDecided {
        /// The task id.
        task_id: String,
        /// The decision it holds.
        decision: Decision,
    },

    /// The task belongs to a stage the instance has already left.
    #[error("Task {task_id} belongs to stage '{stage_id}', which is no longer current")]
    TaskNotInCurrentStage {
        /// The task id.
        task_id: String,
        /// The task's stage.
        stage_id: String,
    },

    /// A caller other than the initiator tried to recall the workflow.
    #[error("Only the initiator can recall workflow {instance_id} (requested by {user_id})")]
    UnauthorizedRecall {
        /// The instance id.
        instance_id: String,
        /// The caller.
        user_id: String,
    },

    /// The instance is not in a recallable status.
    #[error("Cannot recall workflow {instance_id} in status: {status}")]
    InvalidRecallState {
        /// The instance id.
        instance_id: String,
        /// Its current status.
        status: InstanceStatus,
    },

    /// The instance already reached a terminal status.
    #[error("Workflow {instance_id} is already {status}")]
    InstanceTerminal {
        /// The instance id.
        instance_id: String,
        /// The terminal status.
        status: InstanceStatus,
    },

    /// The decision cannot be submitted by an approver.
    #[error("Invalid decision: {decision}. Valid: approved, approved_with_conditions, rejected, abstain")]
    InvalidDecision {
        /// The rejected decision.
        decision: Decision,
    },

    /// A definition failed validation.
    #[error("Invalid workflow definition '{definition_id}': {}", .problems.join("; "))]
    InvalidDefinition {
        /// The definition id.
        definition_id: String,
        /// Human-readable problems found.
        problems: Vec<String>,
    },

    /// The instance changed between load and commit.
    #[error("Concurrent modification of workflow {instance_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The instance id.
        instance_id: String,
        /// The version the caller loaded.
        expected: u64,
        /// The version found at commit.
        actual: u64,
    },

    /// The instance store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A definition file could not be loaded.
    #[error("Failed to load definitions from {path}: {reason}")]
    Load {
        /// The offending file.
        path: String,
        /// Why loading failed.
        reason: String,
    },
}

impl WorkflowError {
    /// Creates a definition-not-found error.
    #[must_use]
    pub fn definition_not_found(definition_id: impl Into<String>) -> Self {
        Self::DefinitionNotFound {
            definition_id: definition_id.into(),
        }
    }

    /// Creates an instance-not-found error.
    #[must_use]
    pub fn instance_not_found(instance_id: impl Into<String>) -> Self {
        Self::InstanceNotFound {
            instance_id: instance_id.into(),
        }
    }

    /// Creates a task-not-found error.
    #[must_use]
    pub fn task_not_found(instance_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self::TaskNotFound {
            instance_id: instance_id.into(),
            task_id: task_id.into(),
        }
    }

    /// Returns a stable machine-readable code for the error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DefinitionNotFound { .. } => "DefinitionNotFound",
            Self::InstanceNotFound { .. } => "InstanceNotFound",
            Self::TaskNotFound { .. } => "TaskNotFound",
            Self::TaskAlreadyDecided { .. } => "TaskAlreadyDecided",
            Self::TaskNotInCurrentStage { .. } => "TaskNotInCurrentStage",
            Self::UnauthorizedRecall { .. } => "UnauthorizedRecall",
            Self::InvalidRecallState { .. } => "InvalidRecallState",
            Self::InstanceTerminal { .. } => "InstanceTerminal",
            Self::InvalidDecision { .. } => "InvalidDecision",
            Self::InvalidDefinition { .. } => "InvalidDefinition",
            Self::ConcurrencyConflict { .. } => "ConcurrencyConflict",
            Self::Storage(_) => "Storage",
            Self::Load { .. } => "Load",
        }
    }

    /// Returns true for lookups that found nothing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DefinitionNotFound { .. } | Self::InstanceNotFound { .. } | Self::TaskNotFound { .. }
        )
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));

        match self {
            Self::DefinitionNotFound { definition_id } => {
                map.insert("definition_id".to_string(), serde_json::json!(definition_id));
            }
            Self::InstanceNotFound { instance_id } => {
                map.insert("instance_id".to_string(), serde_json::json!(instance_id));
            }
            Self::TaskNotFound { instance_id, task_id } => {
                map.insert("instance_id".to_string(), serde_json::json!(instance_id));
                map.insert("task_id".to_string(), serde_json::json!(task_id));
            }
            Self::TaskAlreadyDecided { task_id, decision } => {
                map.insert("task_id".to_string(), serde_json::json!(task_id));
                map.insert("decision".to_string(), serde_json::json!(decision));
            }
            Self::TaskNotInCurrentStage { task_id, stage_id } => {
                map.insert("task_id".to_string(), serde_json::json!(task_id));
                map.insert("stage_id".to_string(), serde_json::json!(stage_id));
            }
            Self::UnauthorizedRecall { instance_id, user_id } => {
                map.insert("instance_id".to_string(), serde_json::json!(instance_id));
                map.insert("user_id".to_string(), serde_json::json!(user_id));
            }
            Self::InvalidRecallState { instance_id, status }
            | Self::InstanceTerminal { instance_id, status } => {
                map.insert("instance_id".to_string(), serde_json::json!(instance_id));
                map.insert("status".to_string(), serde_json::json!(status));
            }
            Self::InvalidDecision { decision } => {
                map.insert("decision".to_string(), serde_json::json!(decision));
            }
            Self::InvalidDefinition {
                definition_id,
                problems,
            } => {
                map.insert("definition_id".to_string(), serde_json::json!(definition_id));
                map.insert("problems".to_string(), serde_json::json!(problems));
            }
            Self::ConcurrencyConflict {
                instance_id,
                expected,
                actual,
            } => {
                map.insert("instance_id".to_string(), serde_json::json!(instance_id));
                map.insert("expected".to_string(), serde_json::json!(expected));
                map.insert("actual".to_string(), serde_json::json!(actual));
            }
            Self::Storage(_) => {}
            Self::Load { path, .. } => {
                map.insert("path".to_string(), serde_json::json!(path));
            }
        }

        map
    }
}

/// Result alias for engine operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
