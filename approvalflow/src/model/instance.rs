//! Workflow instances.

use super::{Task, Transition};
use crate::core::{InstanceStatus, TriggerKind};
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};

/// The live execution of a definition against one entity.
///
/// Instances are never deleted: once terminal they remain as audit records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance id.
    pub id: String,
    /// Definition being executed.
    pub definition_id: String,
    /// Definition display name at start time.
    pub definition_name: String,
    /// Entity type (e.g. "change-order").
    pub entity_type: String,
    /// Entity id.
    pub entity_id: String,
    /// Entity display label (e.g. "ECO-0042").
    pub entity_label: String,
    /// Lifecycle status.
    pub status: InstanceStatus,
    /// Current stage; `None` only before the first stage is entered.
    pub current_stage_id: Option<String>,
    /// Current stage display name.
    pub current_stage_name: Option<String>,
    /// Every task ever created, in creation order.
    pub tasks: Vec<Task>,
    /// Append-only audit log.
    pub transitions: Vec<Transition>,
    /// User who started the workflow.
    pub initiator: String,
    /// When the workflow started.
    pub initiated_at: Timestamp,
    /// When the workflow reached a terminal status.
    pub completed_at: Option<Timestamp>,
    /// Comment supplied at start.
    pub submission_comment: String,
    /// Rejection comment or recall reason.
    pub final_comment: String,
    /// Opaque caller data.
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
    /// Optimistic concurrency counter, bumped on every committed change.
    #[serde(default)]
    pub version: u64,
}

impl Instance {
    /// Gets a task by id.
    #[must_use]
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Gets a mutable task by id.
    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// Returns the tasks still awaiting a decision.
    pub fn pending_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.is_complete())
    }

    /// Returns the tasks holding a decision.
    pub fn completed_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.is_complete())
    }

    /// Returns the tasks of the current stage.
    pub fn current_stage_tasks(&self) -> impl Iterator<Item = &Task> {
        let stage = self.current_stage_id.as_deref();
        self.tasks
            .iter()
            .filter(move |t| stage.is_some_and(|id| t.stage_id == id))
    }

    /// Returns pending tasks of the current stage while the instance is in flight.
    ///
    /// Tasks left pending in an earlier stage (e.g. after an `any` stage
    /// closed) or on a terminal instance are not actionable.
    pub fn actionable_tasks(&self) -> impl Iterator<Item = &Task> {
        let in_progress = self.status.is_in_progress();
        self.current_stage_tasks()
            .filter(move |t| in_progress && !t.is_complete())
    }

    /// Appends a transition that does not change the status.
    pub fn record(&mut self, transition: Transition) {
        debug_assert!(!transition.changes_status());
        self.transitions.push(transition);
    }

    /// Moves to `to` and appends `transition` stamped with the status pair.
    ///
    /// This is the only way the status changes, so every change has exactly
    /// one matching transition.
    pub fn change_status(&mut self, to: InstanceStatus, mut transition: Transition) {
        transition.from_status = Some(self.status);
        transition.to_status = Some(to);
        self.status = to;
        self.transitions.push(transition);
    }

    /// Reconstructs the status by replaying the transition log.
    ///
    /// Returns `None` if a transition's `from_status` does not match the
    /// status reached so far.
    #[must_use]
    pub fn replay_status(&self) -> Option<InstanceStatus> {
        self.transitions
            .iter()
            .filter(|t| t.changes_status())
            .try_fold(InstanceStatus::Draft, |current, t| {
                if t.from_status == Some(current) {
                    t.to_status
                } else {
                    None
                }
            })
    }

    /// Returns the transitions of one kind, in log order.
    pub fn transitions_of(&self, kind: TriggerKind) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.trigger_kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AssigneeKind, Decision};
    use chrono::Utc;

    fn instance() -> Instance {
        let now = Utc::now();
        Instance {
            id: "inst-1".to_string(),
            definition_id: "wf".to_string(),
            definition_name: "Workflow".to_string(),
            entity_type: "part".to_string(),
            entity_id: "p-1".to_string(),
            entity_label: "PN-1".to_string(),
            status: InstanceStatus::Draft,
            current_stage_id: None,
            current_stage_name: None,
            tasks: Vec::new(),
            transitions: Vec::new(),
            initiator: "alice".to_string(),
            initiated_at: now,
            completed_at: None,
            submission_comment: String::new(),
            final_comment: String::new(),
            context: serde_json::Map::new(),
            version: 0,
        }
    }

    fn task(id: &str, stage: &str) -> Task {
        Task::pending(id, "inst-1", stage, stage, "bob", AssigneeKind::User, Utc::now())
    }

    #[test]
    fn test_change_status_records_pair() {
        let mut inst = instance();
        inst.change_status(
            InstanceStatus::Active,
            Transition::new("inst-1", TriggerKind::Initiation, "alice", Utc::now()),
        );

        assert_eq!(inst.status, InstanceStatus::Active);
        let t = &inst.transitions[0];
        assert_eq!(t.from_status, Some(InstanceStatus::Draft));
        assert_eq!(t.to_status, Some(InstanceStatus::Active));
    }

    #[test]
    fn test_replay_status() {
        let mut inst = instance();
        assert_eq!(inst.replay_status(), Some(InstanceStatus::Draft));

        inst.change_status(
            InstanceStatus::Active,
            Transition::new("inst-1", TriggerKind::Initiation, "alice", Utc::now()),
        );
        inst.record(Transition::new("inst-1", TriggerKind::Decision, "bob", Utc::now()));
        inst.change_status(
            InstanceStatus::Cancelled,
            Transition::new("inst-1", TriggerKind::Recall, "alice", Utc::now()),
        );

        assert_eq!(inst.replay_status(), Some(inst.status));
    }

    #[test]
    fn test_replay_detects_gap() {
        let mut inst = instance();
        let mut t = Transition::new("inst-1", TriggerKind::Completion, "x", Utc::now());
        t.from_status = Some(InstanceStatus::PendingApproval);
        t.to_status = Some(InstanceStatus::Completed);
        inst.transitions.push(t);

        assert_eq!(inst.replay_status(), None);
    }

    #[test]
    fn test_current_stage_and_actionable_tasks() {
        let mut inst = instance();
        inst.tasks.push(task("t1", "s1"));
        inst.tasks.push(task("t2", "s2"));
        inst.tasks.push(task("t3", "s2"));
        inst.tasks[2].decision = Decision::Approved;

        assert_eq!(inst.current_stage_tasks().count(), 0);

        inst.current_stage_id = Some("s2".to_string());
        assert_eq!(inst.current_stage_tasks().count(), 2);
        assert_eq!(inst.actionable_tasks().count(), 0);

        inst.status = InstanceStatus::PendingApproval;
        let actionable: Vec<_> = inst.actionable_tasks().map(|t| t.id.as_str()).collect();
        assert_eq!(actionable, vec!["t2"]);

        assert_eq!(inst.pending_tasks().count(), 2);
        assert_eq!(inst.completed_tasks().count(), 1);
    }

    #[test]
    fn test_task_lookup() {
        let mut inst = instance();
        inst.tasks.push(task("t1", "s1"));

        assert!(inst.task("t1").is_some());
        assert!(inst.task("nope").is_none());

        inst.task_mut("t1").unwrap().comments = "note".to_string();
        assert_eq!(inst.task("t1").unwrap().comments, "note");
    }
}
