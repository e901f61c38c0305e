//! Instance persistence.
//!
//! The engine talks to storage through [`InstanceStore`]. Writes use
//! optimistic concurrency: `update` succeeds only if the stored version still
//! matches the version the caller loaded.

mod memory;

pub use memory::InMemoryInstanceStore;

use crate::core::InstanceStatus;
use crate::errors::WorkflowError;
use crate::model::Instance;
use thiserror::Error;

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No instance with the id.
    #[error("instance not found: {0}")]
    NotFound(String),

    /// An instance with the id already exists.
    #[error("instance already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic locking failed.
    #[error("concurrency conflict on {instance_id}: expected version {expected}, got {actual}")]
    Conflict {
        /// The instance id.
        instance_id: String,
        /// The version the caller loaded.
        expected: u64,
        /// The version currently stored.
        actual: u64,
    },

    /// The backend failed.
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(instance_id) => Self::InstanceNotFound { instance_id },
            StoreError::Conflict {
                instance_id,
                expected,
                actual,
            } => Self::ConcurrencyConflict {
                instance_id,
                expected,
                actual,
            },
            other @ (StoreError::AlreadyExists(_) | StoreError::Backend(_)) => {
                Self::Storage(other.to_string())
            }
        }
    }
}

/// Selects instances by entity and status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceFilter {
    /// Entity type to match.
    pub entity_type: Option<String>,
    /// Entity id to match.
    pub entity_id: Option<String>,
    /// Statuses to match; empty matches any status.
    pub statuses: Vec<InstanceStatus>,
}

impl InstanceFilter {
    /// Matches every instance.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches instances that are active or pending approval.
    #[must_use]
    pub fn in_progress() -> Self {
        Self::default().with_statuses([InstanceStatus::Active, InstanceStatus::PendingApproval])
    }

    /// Matches instances of one entity.
    #[must_use]
    pub fn for_entity(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.into()),
            statuses: Vec::new(),
        }
    }

    /// Restricts the statuses.
    #[must_use]
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = InstanceStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Returns true if `instance` passes the filter.
    #[must_use]
    pub fn matches(&self, instance: &Instance) -> bool {
        self.entity_type
            .as_deref()
            .is_none_or(|t| instance.entity_type == t)
            && self
                .entity_id
                .as_deref()
                .is_none_or(|id| instance.entity_id == id)
            && (self.statuses.is_empty() || self.statuses.contains(&instance.status))
    }
}

/// Storage for workflow instances.
///
/// Implementations must make `update` atomic per instance id: the version
/// check and the write happen under one lock or one transaction.
#[cfg_attr(test, mockall::automock)]
pub trait InstanceStore: Send + Sync {
    /// Stores a new instance at version 1 and returns the stored copy.
    fn insert(&self, instance: Instance) -> Result<Instance, StoreError>;

    /// Loads an instance.
    fn get(&self, instance_id: &str) -> Result<Option<Instance>, StoreError>;

    /// Replaces an instance if its stored version equals `expected_version`.
    ///
    /// Returns the stored copy with its version bumped.
    fn update(&self, instance: Instance, expected_version: u64) -> Result<Instance, StoreError>;

    /// Returns the instances passing `filter`, oldest first.
    fn find(&self, filter: &InstanceFilter) -> Result<Vec<Instance>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::draft_instance;

    #[test]
    fn test_filter_matches() {
        let mut inst = draft_instance("inst-1", "part", "p-1");
        inst.status = InstanceStatus::PendingApproval;

        assert!(InstanceFilter::all().matches(&inst));
        assert!(InstanceFilter::in_progress().matches(&inst));
        assert!(InstanceFilter::for_entity("part", "p-1").matches(&inst));
        assert!(!InstanceFilter::for_entity("part", "p-2").matches(&inst));
        assert!(!InstanceFilter::for_entity("document", "p-1").matches(&inst));

        let by_type = InstanceFilter {
            entity_type: Some("part".to_string()),
            ..InstanceFilter::all()
        };
        assert!(by_type.matches(&inst));
        let by_id = InstanceFilter {
            entity_id: Some("p-2".to_string()),
            ..InstanceFilter::all()
        };
        assert!(!by_id.matches(&inst));

        inst.status = InstanceStatus::Completed;
        assert!(!InstanceFilter::in_progress().matches(&inst));
    }

    #[test]
    fn test_store_error_conversion() {
        let err: WorkflowError = StoreError::NotFound("inst-1".to_string()).into();
        assert_eq!(err.code(), "InstanceNotFound");

        let err: WorkflowError = StoreError::Conflict {
            instance_id: "inst-1".to_string(),
            expected: 2,
            actual: 3,
        }
        .into();
        assert_eq!(err.code(), "ConcurrencyConflict");

        let err: WorkflowError = StoreError::Backend("disk full".to_string()).into();
        assert!(err.to_string().contains("disk full"));
    }
}
