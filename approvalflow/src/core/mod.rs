//! Core domain types for approvalflow.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Instance status, task decision and kind enums (with wire values)
//! - The aggregation policy that turns task decisions into a stage verdict

mod aggregation;
mod status;

pub use aggregation::{Aggregation, StageTally};
pub use status::{AssigneeKind, Decision, InstanceStatus, ParseEnumError, StageKind, TriggerKind};
