//! Stage templates.

use crate::core::{Aggregation, StageKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One step of a workflow definition.
///
/// Stages are ordered by `sequence`. Sequence values need not be
/// contiguous: the stage after `n` is the one with the smallest sequence
/// strictly greater than `n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Stage id, unique within its definition.
    pub id: String,
    /// Display name (e.g. "Engineering Review").
    pub name: String,
    /// What the stage asks of its assignees.
    #[serde(default)]
    pub kind: StageKind,
    /// Position in the definition.
    #[serde(default)]
    pub sequence: i32,
    /// Roles that receive one task each.
    #[serde(default)]
    pub approver_roles: BTreeSet<String>,
    /// Users that receive one task each.
    #[serde(default)]
    pub approver_users: BTreeSet<String>,
    /// How the task decisions combine.
    #[serde(default, alias = "approval_mode")]
    pub aggregation: Aggregation,
    /// Days until a task is due.
    #[serde(default = "default_due_days")]
    pub due_days: u32,
    /// Days after assignment before a pending task should be escalated.
    #[serde(default = "default_escalation_days")]
    pub escalation_days: u32,
    /// Role or user to escalate to.
    #[serde(default)]
    pub escalate_to: Option<String>,
    /// Whether the stage is mandatory.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Free-form guidance for assignees.
    #[serde(default)]
    pub instructions: String,
    /// Items an assignee should verify.
    #[serde(default)]
    pub checklist: Vec<String>,
}

fn default_due_days() -> u32 {
    5
}

fn default_escalation_days() -> u32 {
    3
}

fn default_required() -> bool {
    true
}

impl Stage {
    /// Creates an approval stage with default timing and no approvers.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, sequence: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: StageKind::default(),
            sequence,
            approver_roles: BTreeSet::new(),
            approver_users: BTreeSet::new(),
            aggregation: Aggregation::default(),
            due_days: default_due_days(),
            escalation_days: default_escalation_days(),
            escalate_to: None,
            required: default_required(),
            instructions: String::new(),
            checklist: Vec::new(),
        }
    }

    /// Sets the stage kind.
    #[must_use]
    pub fn with_kind(mut self, kind: StageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the aggregation policy.
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Adds approver roles.
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.approver_roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Adds approver users.
    #[must_use]
    pub fn with_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.approver_users.extend(users.into_iter().map(Into::into));
        self
    }

    /// Sets the due period in days.
    #[must_use]
    pub fn with_due_days(mut self, days: u32) -> Self {
        self.due_days = days;
        self
    }

    /// Sets the escalation window and target.
    #[must_use]
    pub fn with_escalation(mut self, days: u32, escalate_to: impl Into<String>) -> Self {
        self.escalation_days = days;
        self.escalate_to = Some(escalate_to.into());
        self
    }

    /// Marks the stage optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets the instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Sets the checklist.
    #[must_use]
    pub fn with_checklist<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checklist = items.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if neither users nor roles are configured.
    #[must_use]
    pub fn has_no_approvers(&self) -> bool {
        self.approver_users.is_empty() && self.approver_roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_builder() {
        let stage = Stage::new("s1", "Review", 10)
            .with_kind(StageKind::Review)
            .with_aggregation(Aggregation::Any)
            .with_roles(["engineer"])
            .with_users(["alice", "bob"])
            .with_due_days(2)
            .with_escalation(1, "engineering_manager");

        assert_eq!(stage.sequence, 10);
        assert_eq!(stage.approver_users.len(), 2);
        assert!(stage.approver_roles.contains("engineer"));
        assert_eq!(stage.escalate_to.as_deref(), Some("engineering_manager"));
        assert!(stage.required);
        assert!(!stage.has_no_approvers());
    }

    #[test]
    fn test_stage_defaults_from_json() {
        let stage: Stage = serde_json::from_str(
            r#"{"id": "s", "name": "Sign-off", "approval_mode": "majority", "approver_users": ["a"]}"#,
        )
        .unwrap();

        assert_eq!(stage.aggregation, Aggregation::Majority);
        assert_eq!(stage.kind, StageKind::Approval);
        assert_eq!(stage.due_days, 5);
        assert_eq!(stage.escalation_days, 3);
        assert!(stage.required);
    }

    #[test]
    fn test_stage_without_approvers() {
        assert!(Stage::new("s", "Empty", 1).has_no_approvers());
    }
}
