//! Identifier generation.

use uuid::Uuid;

/// Generates a new time-ordered UUID (v7).
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::now_v7()
}

/// Generates a new identifier for instances, tasks and transitions.
///
/// Identifiers sort by creation time, which keeps audit logs and task
/// listings in a stable order when a store returns them by id.
#[must_use]
pub fn generate_id() -> String {
    generate_uuid().to_string()
}
