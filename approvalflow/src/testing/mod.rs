//! Testing utilities for approval workflows.
//!
//! This module provides:
//! - Definition and instance fixtures
//! - An engine harness with a manual clock and a collecting event sink
//! - Assertions over instance status and the audit log

mod assertions;
pub mod fixtures;

pub use assertions::{assert_audit_consistent, assert_pending_assignees, assert_status};
pub use fixtures::{
    draft_instance, single_stage_definition, two_stage_definition, TestEngine,
};
