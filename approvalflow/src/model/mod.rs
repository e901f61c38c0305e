//! Workflow data model.
//!
//! - [`Stage`] and [`Definition`] are templates: registered once, never mutated.
//! - [`Instance`] is the live execution of a definition against one entity.
//!   It owns its [`Task`]s and its append-only [`Transition`] log.

mod definition;
mod instance;
mod stage;
mod task;
mod transition;

pub use definition::{Definition, DefinitionIssue};
pub use instance::Instance;
pub use stage::Stage;
pub use task::Task;
pub use transition::Transition;
