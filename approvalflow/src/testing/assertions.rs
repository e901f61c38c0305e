//! Test assertions for workflow instances.

use crate::core::InstanceStatus;
use crate::model::Instance;

/// Asserts that the instance has the expected status.
pub fn assert_status(instance: &Instance, expected: InstanceStatus) {
    assert_eq!(
        instance.status, expected,
        "Expected status {expected}, got {} (instance {})",
        instance.status, instance.id
    );
}

/// Asserts that the audit log is consistent with the instance.
///
/// Replaying the status-changing transitions must reach the current status,
/// every completed task must carry a completion time, and terminal
/// instances must carry one too.
pub fn assert_audit_consistent(instance: &Instance) {
    assert_eq!(
        instance.replay_status(),
        Some(instance.status),
        "Transition log does not replay to {}: {:?}",
        instance.status,
        instance
            .transitions
            .iter()
            .map(|t| (t.trigger_kind, t.from_status, t.to_status))
            .collect::<Vec<_>>()
    );

    for task in instance.completed_tasks() {
        assert!(
            task.completed_at.is_some(),
            "Task {} is {} but has no completion time",
            task.id,
            task.decision
        );
    }

    if instance.status.is_terminal() {
        assert!(
            instance.completed_at.is_some(),
            "Terminal instance {} has no completion time",
            instance.id
        );
    }
}

/// Asserts the assignees of the actionable tasks, in task order.
pub fn assert_pending_assignees(instance: &Instance, expected: &[&str]) {
    let actual: Vec<&str> = instance
        .actionable_tasks()
        .map(|t| t.assignee_id.as_str())
        .collect();
    assert_eq!(actual, expected, "Unexpected actionable assignees");
}
