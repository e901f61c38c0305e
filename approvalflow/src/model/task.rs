//! Approval tasks.

use crate::core::{AssigneeKind, Decision};
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};

/// One assignable decision unit inside a running stage.
///
/// A task is complete once its decision leaves `pending`, and a completed
/// task is never modified again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task id.
    pub id: String,
    /// Owning instance.
    pub instance_id: String,
    /// Stage the task belongs to.
    pub stage_id: String,
    /// Stage display name.
    pub stage_name: String,
    /// User id or role name.
    pub assignee_id: String,
    /// Display label of the assignee.
    pub assignee_label: String,
    /// Whether `assignee_id` names a user or a role.
    pub assignee_kind: AssigneeKind,
    /// Current decision.
    pub decision: Decision,
    /// When the decision was made.
    pub decision_at: Option<Timestamp>,
    /// When the task left `pending` (decision, delegation or recall).
    pub completed_at: Option<Timestamp>,
    /// When the task was created.
    pub created_at: Timestamp,
    /// When the task is due.
    pub due_at: Option<Timestamp>,
    /// User who handed this task over, for delegated tasks.
    pub delegated_from: Option<String>,
    /// User this task was handed to.
    pub delegated_to: Option<String>,
    /// Decision or delegation comments.
    pub comments: String,
    /// Conditions attached to a conditional approval.
    pub conditions: Vec<String>,
}

impl Task {
    /// Creates a pending task.
    #[must_use]
    pub fn pending(
        id: impl Into<String>,
        instance_id: impl Into<String>,
        stage_id: impl Into<String>,
        stage_name: impl Into<String>,
        assignee_id: impl Into<String>,
        assignee_kind: AssigneeKind,
        created_at: Timestamp,
    ) -> Self {
        let assignee_id = assignee_id.into();
        let assignee_label = assignee_label(&assignee_id, assignee_kind);
        Self {
            id: id.into(),
            instance_id: instance_id.into(),
            stage_id: stage_id.into(),
            stage_name: stage_name.into(),
            assignee_id,
            assignee_label,
            assignee_kind,
            decision: Decision::Pending,
            decision_at: None,
            completed_at: None,
            created_at,
            due_at: None,
            delegated_from: None,
            delegated_to: None,
            comments: String::new(),
            conditions: Vec::new(),
        }
    }

    /// Sets the due date.
    #[must_use]
    pub fn with_due_at(mut self, due_at: Option<Timestamp>) -> Self {
        self.due_at = due_at;
        self
    }

    /// Sets the assignee display label.
    #[must_use]
    pub fn with_assignee_label(mut self, label: impl Into<String>) -> Self {
        self.assignee_label = label.into();
        self
    }

    /// Returns true once the decision has left `pending`.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.decision.is_complete()
    }

    /// Returns true if the task is pending past its due date.
    #[must_use]
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        !self.is_complete() && self.due_at.is_some_and(|due| now > due)
    }

    /// Returns true if the task is assigned to `user_id` directly.
    #[must_use]
    pub fn is_assigned_to_user(&self, user_id: &str) -> bool {
        self.assignee_kind == AssigneeKind::User && self.assignee_id == user_id
    }

    /// Returns true if the task is assigned to `role`.
    #[must_use]
    pub fn is_assigned_to_role(&self, role: &str) -> bool {
        self.assignee_kind == AssigneeKind::Role && self.assignee_id == role
    }
}

/// Default display label: users keep their id, roles are title-cased
/// (`engineering_manager` becomes `Engineering Manager`).
fn assignee_label(assignee_id: &str, kind: AssigneeKind) -> String {
    match kind {
        AssigneeKind::User => assignee_id.to_string(),
        AssigneeKind::Role => assignee_id
            .split(['_', '-'])
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                })
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn task(kind: AssigneeKind, assignee: &str) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        Task::pending("t1", "i1", "s1", "Review", assignee, kind, at)
    }

    #[test]
    fn test_pending_task() {
        let t = task(AssigneeKind::User, "alice");
        assert!(!t.is_complete());
        assert_eq!(t.assignee_label, "alice");
        assert!(t.is_assigned_to_user("alice"));
        assert!(!t.is_assigned_to_role("alice"));
    }

    #[test]
    fn test_role_label_is_title_cased() {
        let t = task(AssigneeKind::Role, "engineering_manager");
        assert_eq!(t.assignee_label, "Engineering Manager");
        assert!(t.is_assigned_to_role("engineering_manager"));
    }

    #[test]
    fn test_is_overdue() {
        let t = task(AssigneeKind::User, "alice");
        let due = t.created_at + Duration::days(2);
        let mut t = t.with_due_at(Some(due));

        assert!(!t.is_overdue(due));
        assert!(t.is_overdue(due + Duration::seconds(1)));

        t.decision = Decision::Approved;
        assert!(!t.is_overdue(due + Duration::days(10)));
    }

    #[test]
    fn test_task_without_due_date_is_never_overdue() {
        let t = task(AssigneeKind::User, "alice");
        assert!(!t.is_overdue(t.created_at + Duration::days(365)));
    }
}
