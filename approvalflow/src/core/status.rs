//! Status, decision and kind enums with their wire representations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a wire string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} value: '{value}'")]
pub struct ParseEnumError {
    /// The enum being parsed (e.g. "decision").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Lifecycle status of a workflow instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// Not yet started.
    #[default]
    Draft,
    /// Started, no stage entered yet.
    Active,
    /// Waiting on the tasks of the current stage.
    #[serde(rename = "pending")]
    PendingApproval,
    /// All approvals complete.
    Approved,
    /// Rejected by an approver.
    Rejected,
    /// Recalled by the initiator.
    Cancelled,
    /// Temporarily paused.
    OnHold,
    /// Every stage completed.
    Completed,
}

impl InstanceStatus {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::PendingApproval => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
        }
    }

    /// Returns true if no further stage or task can follow this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Completed)
    }

    /// Returns true if the instance is still in flight.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::Active | Self::PendingApproval)
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            "on_hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            other => Err(ParseEnumError::new("instance status", other)),
        }
    }
}

/// The decision recorded on a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Not yet decided.
    #[default]
    Pending,
    /// Approved without conditions.
    Approved,
    /// Approved, subject to the task's conditions.
    ApprovedWithConditions,
    /// Rejected.
    Rejected,
    /// Handed to another user; a replacement task exists.
    #[serde(rename = "delegate")]
    Delegated,
    /// Abstained from voting.
    Abstain,
    /// Closed because the initiator recalled the workflow.
    Recalled,
}

impl Decision {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::ApprovedWithConditions => "approved_with_conditions",
            Self::Rejected => "rejected",
            Self::Delegated => "delegate",
            Self::Abstain => "abstain",
            Self::Recalled => "recalled",
        }
    }

    /// Returns true once the task has left `pending`.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true for `approved` and `approved_with_conditions`.
    #[must_use]
    pub const fn is_approval(&self) -> bool {
        matches!(self, Self::Approved | Self::ApprovedWithConditions)
    }

    /// Returns true if an approver may submit this decision through `decide`.
    ///
    /// `delegate` and `recalled` are assigned by the engine itself.
    #[must_use]
    pub const fn is_user_decision(&self) -> bool {
        matches!(
            self,
            Self::Approved | Self::ApprovedWithConditions | Self::Rejected | Self::Abstain
        )
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "approved_with_conditions" => Ok(Self::ApprovedWithConditions),
            "rejected" => Ok(Self::Rejected),
            "delegate" => Ok(Self::Delegated),
            "abstain" => Ok(Self::Abstain),
            "recalled" => Ok(Self::Recalled),
            other => Err(ParseEnumError::new("decision", other)),
        }
    }
}

/// The kind of work a stage asks of its assignees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Requires an approval decision.
    #[default]
    Approval,
    /// Review only.
    Review,
    /// Notify the assignees.
    Notification,
    /// Generic task completion.
    Task,
}

impl StageKind {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approval => "approval",
            Self::Review => "review",
            Self::Notification => "notification",
            Self::Task => "task",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approval" => Ok(Self::Approval),
            "review" => Ok(Self::Review),
            "notification" => Ok(Self::Notification),
            "task" => Ok(Self::Task),
            other => Err(ParseEnumError::new("stage kind", other)),
        }
    }
}

/// Whether a task is assigned to a single user or to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssigneeKind {
    /// A named user.
    User,
    /// Anyone holding the role.
    Role,
}

impl AssigneeKind {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Role => "role",
        }
    }
}

impl fmt::Display for AssigneeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssigneeKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "role" => Ok(Self::Role),
            other => Err(ParseEnumError::new("assignee kind", other)),
        }
    }
}

/// What caused a transition to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// The workflow was started.
    Initiation,
    /// A stage was entered.
    StageAdvance,
    /// A task was decided.
    Decision,
    /// A task was handed to another user.
    Delegation,
    /// A rejection ended the workflow.
    Rejection,
    /// The initiator recalled the workflow.
    Recall,
    /// The last stage completed.
    Completion,
}

impl TriggerKind {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initiation => "initiation",
            Self::StageAdvance => "stage_advance",
            Self::Decision => "decision",
            Self::Delegation => "delegation",
            Self::Rejection => "rejection",
            Self::Recall => "recall",
            Self::Completion => "completion",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiation" => Ok(Self::Initiation),
            "stage_advance" => Ok(Self::StageAdvance),
            "decision" => Ok(Self::Decision),
            "delegation" => Ok(Self::Delegation),
            "rejection" => Ok(Self::Rejection),
            "recall" => Ok(Self::Recall),
            "completion" => Ok(Self::Completion),
            other => Err(ParseEnumError::new("trigger kind", other)),
        }
    }
}
