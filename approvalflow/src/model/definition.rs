//! Workflow definitions.

use super::Stage;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// A reusable workflow template composed of ordered stages.
///
/// Definitions are immutable once registered. A change means registering a
/// new definition under a new id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Definition id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Template version label.
    #[serde(default = "default_version")]
    pub version: String,
    /// Entity types this workflow applies to.
    #[serde(default)]
    pub entity_types: BTreeSet<String>,
    /// Stages in declaration order (execution order follows `sequence`).
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// Inactive definitions are hidden from entity-type listings.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Recipients notified when an instance starts.
    #[serde(default)]
    pub notify_on_start: Vec<String>,
    /// Recipients notified when an instance completes.
    #[serde(default)]
    pub notify_on_complete: Vec<String>,
    /// Recipients notified when an instance is rejected.
    #[serde(default)]
    pub notify_on_reject: Vec<String>,
    /// When the definition was authored.
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    /// Who authored the definition.
    #[serde(default)]
    pub created_by: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_active() -> bool {
    true
}

/// A configuration problem found in a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionIssue {
    /// The definition id is blank.
    EmptyId,
    /// The definition has no stages; instances would never leave `active`.
    NoStages,
    /// Two stages share an id.
    DuplicateStageId(String),
    /// Two stages share a sequence, making the stage order ambiguous.
    DuplicateSequence(i32),
    /// A stage has neither approver users nor roles and can never complete.
    NoApprovers(String),
}

impl DefinitionIssue {
    /// Returns true if the definition must not be registered.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EmptyId | Self::DuplicateStageId(_) | Self::DuplicateSequence(_)
        )
    }

    /// Returns true if the issue prevents registration.
    ///
    /// Fatal issues always do. In strict mode, so do definitions that
    /// could start instances that never finish.
    #[must_use]
    pub const fn blocks_registration(&self, strict: bool) -> bool {
        self.is_fatal() || (strict && matches!(self, Self::NoStages | Self::NoApprovers(_)))
    }
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "definition id is empty"),
            Self::NoStages => write!(f, "definition has no stages"),
            Self::DuplicateStageId(id) => write!(f, "duplicate stage id '{id}'"),
            Self::DuplicateSequence(seq) => write!(f, "duplicate stage sequence {seq}"),
            Self::NoApprovers(id) => write!(f, "stage '{id}' has no approver users or roles"),
        }
    }
}

impl Definition {
    /// Creates an active definition with no stages.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: default_version(),
            entity_types: BTreeSet::new(),
            stages: Vec::new(),
            is_active: true,
            notify_on_start: Vec::new(),
            notify_on_complete: Vec::new(),
            notify_on_reject: Vec::new(),
            created_at: None,
            created_by: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the version label.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Adds applicable entity types.
    #[must_use]
    pub fn with_entity_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_types.extend(types.into_iter().map(Into::into));
        self
    }

    /// Appends a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Sets the start notification recipients.
    #[must_use]
    pub fn notify_on_start<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.notify_on_start = recipients.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the completion notification recipients.
    #[must_use]
    pub fn notify_on_complete<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.notify_on_complete = recipients.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the rejection notification recipients.
    #[must_use]
    pub fn notify_on_reject<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.notify_on_reject = recipients.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the definition inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Returns true if the definition lists `entity_type`.
    #[must_use]
    pub fn applies_to(&self, entity_type: &str) -> bool {
        self.entity_types.contains(entity_type)
    }

    /// Gets a stage by id.
    #[must_use]
    pub fn stage(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    /// Gets the stage with the smallest sequence.
    #[must_use]
    pub fn first_stage(&self) -> Option<&Stage> {
        self.stages.iter().min_by_key(|s| s.sequence)
    }

    /// Gets the stage that follows `current_stage_id`.
    ///
    /// Returns `None` when the current stage is unknown or is the last one.
    #[must_use]
    pub fn next_stage(&self, current_stage_id: &str) -> Option<&Stage> {
        let current = self.stage(current_stage_id)?;
        self.stages
            .iter()
            .filter(|s| s.sequence > current.sequence)
            .min_by_key(|s| s.sequence)
    }

    /// Lists configuration problems, fatal and advisory.
    #[must_use]
    pub fn issues(&self) -> Vec<DefinitionIssue> {
        let mut issues = Vec::new();

        if self.id.trim().is_empty() {
            issues.push(DefinitionIssue::EmptyId);
        }
        if self.stages.is_empty() {
            issues.push(DefinitionIssue::NoStages);
        }

        let mut ids = HashSet::new();
        let mut sequences = HashSet::new();
        for stage in &self.stages {
            if !ids.insert(stage.id.as_str()) {
                issues.push(DefinitionIssue::DuplicateStageId(stage.id.clone()));
            }
            if !sequences.insert(stage.sequence) {
                issues.push(DefinitionIssue::DuplicateSequence(stage.sequence));
            }
            if stage.has_no_approvers() {
                issues.push(DefinitionIssue::NoApprovers(stage.id.clone()));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sparse_definition() -> Definition {
        Definition::new("wf", "Sparse")
            .with_entity_types(["part"])
            .with_stage(Stage::new("c", "Third", 30).with_users(["u"]))
            .with_stage(Stage::new("a", "First", 5).with_users(["u"]))
            .with_stage(Stage::new("b", "Second", 17).with_users(["u"]))
    }

    #[test]
    fn test_first_stage_is_smallest_sequence() {
        let def = sparse_definition();
        assert_eq!(def.first_stage().map(|s| s.id.as_str()), Some("a"));
    }

    #[test]
    fn test_next_stage_skips_gaps() {
        let def = sparse_definition();
        assert_eq!(def.next_stage("a").map(|s| s.id.as_str()), Some("b"));
        assert_eq!(def.next_stage("b").map(|s| s.id.as_str()), Some("c"));
        assert!(def.next_stage("c").is_none());
        assert!(def.next_stage("missing").is_none());
    }

    #[test]
    fn test_applies_to() {
        let def = sparse_definition();
        assert!(def.applies_to("part"));
        assert!(!def.applies_to("document"));
    }

    #[test]
    fn test_issues_on_valid_definition() {
        assert!(sparse_definition().issues().is_empty());
    }

    #[test]
    fn test_issues_detects_problems() {
        let def = Definition::new(" ", "Broken")
            .with_stage(Stage::new("a", "One", 1).with_users(["u"]))
            .with_stage(Stage::new("a", "Two", 1));

        assert_eq!(
            def.issues(),
            vec![
                DefinitionIssue::EmptyId,
                DefinitionIssue::DuplicateStageId("a".to_string()),
                DefinitionIssue::DuplicateSequence(1),
                DefinitionIssue::NoApprovers("a".to_string()),
            ]
        );
    }

    #[test]
    fn test_issue_severity() {
        assert!(DefinitionIssue::DuplicateSequence(3).is_fatal());
        assert!(!DefinitionIssue::NoStages.is_fatal());
        assert!(!DefinitionIssue::NoApprovers("s".to_string()).is_fatal());
        assert!(DefinitionIssue::EmptyId.blocks_registration(false));
        assert!(!DefinitionIssue::NoStages.blocks_registration(false));
        assert!(DefinitionIssue::NoStages.blocks_registration(true));
        assert!(DefinitionIssue::NoApprovers("s".to_string()).blocks_registration(true));
        assert_eq!(
            DefinitionIssue::NoApprovers("s".to_string()).to_string(),
            "stage 's' has no approver users or roles"
        );
    }

    #[test]
    fn test_definition_from_json_defaults() {
        let def: Definition = serde_json::from_str(
            r#"{"id": "wf-json", "name": "From JSON", "entity_types": ["document"]}"#,
        )
        .unwrap();

        assert!(def.is_active);
        assert_eq!(def.version, "1.0");
        assert!(def.stages.is_empty());
        assert!(def.applies_to("document"));
    }
}
