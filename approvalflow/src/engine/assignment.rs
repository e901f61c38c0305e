//! Assignment resolution.

use crate::core::AssigneeKind;
use crate::model::Stage;

/// One task to create when a stage is entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// User id or role name.
    pub assignee_id: String,
    /// Whether `assignee_id` names a user or a role.
    pub assignee_kind: AssigneeKind,
}

/// Lists the tasks a stage fans out to: named users first, then roles.
///
/// An empty result means the stage has no approvers and can never collect a
/// decision.
#[must_use]
pub fn resolve_assignments(stage: &Stage) -> Vec<Assignment> {
    let users = stage.approver_users.iter().map(|id| Assignment {
        assignee_id: id.clone(),
        assignee_kind: AssigneeKind::User,
    });
    let roles = stage.approver_roles.iter().map(|role| Assignment {
        assignee_id: role.clone(),
        assignee_kind: AssigneeKind::Role,
    });
    users.chain(roles).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_users_before_roles() {
        let stage = Stage::new("s1", "Review", 1)
            .with_roles(["quality_engineer"])
            .with_users(["bob", "alice"]);

        let kinds: Vec<_> = resolve_assignments(&stage)
            .into_iter()
            .map(|a| (a.assignee_id, a.assignee_kind))
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("alice".to_string(), AssigneeKind::User),
                ("bob".to_string(), AssigneeKind::User),
                ("quality_engineer".to_string(), AssigneeKind::Role),
            ]
        );
    }

    #[test]
    fn test_no_approvers() {
        let stage = Stage::new("s1", "Empty", 1);
        assert!(resolve_assignments(&stage).is_empty());
    }
}
