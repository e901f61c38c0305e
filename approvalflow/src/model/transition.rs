//! Audit log records.

use crate::core::{Decision, InstanceStatus, TriggerKind};
use crate::utils::{generate_id, Timestamp};
use serde::{Deserialize, Serialize};

/// An immutable, timestamped record of a state or stage change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Transition id.
    pub id: String,
    /// Owning instance.
    pub instance_id: String,
    /// When the change happened.
    pub timestamp: Timestamp,
    /// Stage before the change.
    pub from_stage: Option<String>,
    /// Stage after the change.
    pub to_stage: Option<String>,
    /// Status before the change, when the status changed.
    pub from_status: Option<InstanceStatus>,
    /// Status after the change, when the status changed.
    pub to_status: Option<InstanceStatus>,
    /// User who caused the change.
    pub triggered_by: String,
    /// What caused the change.
    pub trigger_kind: TriggerKind,
    /// Task involved, if any.
    pub task_id: Option<String>,
    /// Decision involved, if any.
    pub decision: Option<Decision>,
    /// Free-form comments.
    pub comments: String,
}

impl Transition {
    /// Creates a transition with a fresh id and no stage or status data.
    #[must_use]
    pub fn new(
        instance_id: impl Into<String>,
        trigger_kind: TriggerKind,
        triggered_by: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: generate_id(),
            instance_id: instance_id.into(),
            timestamp,
            from_stage: None,
            to_stage: None,
            from_status: None,
            to_status: None,
            triggered_by: triggered_by.into(),
            trigger_kind,
            task_id: None,
            decision: None,
            comments: String::new(),
        }
    }

    /// Sets the stage pair.
    #[must_use]
    pub fn with_stages(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.from_stage = from;
        self.to_stage = to;
        self
    }

    /// Sets the task and decision involved.
    #[must_use]
    pub fn with_task(mut self, task_id: impl Into<String>, decision: Decision) -> Self {
        self.task_id = Some(task_id.into());
        self.decision = Some(decision);
        self
    }

    /// Sets the comments.
    #[must_use]
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    /// Returns true if the transition records a status change.
    #[must_use]
    pub const fn changes_status(&self) -> bool {
        self.to_status.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_transition_builder() {
        let t = Transition::new("inst-1", TriggerKind::Decision, "alice", Utc::now())
            .with_stages(Some("s1".to_string()), Some("s1".to_string()))
            .with_task("task-1", Decision::Approved)
            .with_comments("looks good");

        assert_eq!(t.task_id.as_deref(), Some("task-1"));
        assert_eq!(t.decision, Some(Decision::Approved));
        assert_eq!(t.comments, "looks good");
        assert!(!t.changes_status());
    }

    #[test]
    fn test_transition_serializes_wire_values() {
        let mut t = Transition::new("inst-1", TriggerKind::StageAdvance, "alice", Utc::now());
        t.from_status = Some(InstanceStatus::Active);
        t.to_status = Some(InstanceStatus::PendingApproval);

        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["trigger_kind"], "stage_advance");
        assert_eq!(json["to_status"], "pending");
        assert!(t.changes_status());
    }
}
