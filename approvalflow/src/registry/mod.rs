//! Definition registry.
//!
//! The registry is the catalog of workflow templates. It is bootstrapped with
//! the built-in change-order, document and part definitions and can be
//! extended at runtime or from JSON files.

mod builtin;
mod loader;

pub use builtin::{
    builtin_definitions, change_order_definition, document_review_definition,
    part_release_definition, CHANGE_ORDER_DEFINITION_ID, DOCUMENT_REVIEW_DEFINITION_ID,
    PART_RELEASE_DEFINITION_ID,
};
pub use loader::LoadEvent;

use crate::errors::{WorkflowError, WorkflowResult};
use crate::model::{Definition, DefinitionIssue};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Catalog of workflow definitions keyed by id.
#[derive(Default)]
pub struct DefinitionRegistry {
    definitions: RwLock<HashMap<String, Arc<Definition>>>,
}

impl DefinitionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in definitions.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for definition in builtin_definitions() {
            if let Err(e) = registry.register(definition) {
                warn!("Skipping built-in workflow definition: {}", e);
            }
        }
        registry
    }

    /// Registers a definition, refusing fatal problems and ids that are
    /// already taken.
    ///
    /// Remaining configuration problems are logged, not corrected.
    pub fn register(&self, definition: Definition) -> WorkflowResult<Arc<Definition>> {
        self.register_with(definition, false)
    }

    /// Registers a definition. With `strict`, definitions without stages or
    /// with approver-less stages are refused as well.
    ///
    /// A registered definition is never replaced: running instances keep
    /// resolving their definition by id.
    pub fn register_with(
        &self,
        definition: Definition,
        strict: bool,
    ) -> WorkflowResult<Arc<Definition>> {
        let issues = definition.issues();
        let mut problems = blocking_problems(&issues, strict);

        let mut definitions = self.definitions.write();
        if definitions.contains_key(&definition.id) {
            problems.push(already_registered(&definition.id));
        }
        if !problems.is_empty() {
            return Err(WorkflowError::InvalidDefinition {
                definition_id: definition.id,
                problems,
            });
        }

        for issue in &issues {
            warn!(
                definition_id = %definition.id,
                issue = %issue,
                "Workflow definition has a configuration problem"
            );
        }

        let definition = Arc::new(definition);
        definitions.insert(definition.id.clone(), Arc::clone(&definition));
        drop(definitions);

        info!(definition_id = %definition.id, "Registered workflow definition: {}", definition.name);
        Ok(definition)
    }

    /// Returns the reasons `definition` would be refused, without
    /// registering it.
    #[must_use]
    pub fn registration_problems(&self, definition: &Definition, strict: bool) -> Vec<String> {
        let mut problems = blocking_problems(&definition.issues(), strict);
        if self.contains(&definition.id) {
            problems.push(already_registered(&definition.id));
        }
        problems
    }

    /// Gets a definition by id, active or not.
    #[must_use]
    pub fn get(&self, definition_id: &str) -> Option<Arc<Definition>> {
        self.definitions.read().get(definition_id).cloned()
    }

    /// Lists the active definitions that apply to `entity_type`, sorted by id.
    #[must_use]
    pub fn list_for_entity_type(&self, entity_type: &str) -> Vec<Arc<Definition>> {
        let mut matches: Vec<_> = self
            .definitions
            .read()
            .values()
            .filter(|d| d.is_active && d.applies_to(entity_type))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    /// Lists every definition, sorted by id.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<Definition>> {
        let mut all: Vec<_> = self.definitions.read().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Returns true if a definition is registered under `definition_id`.
    #[must_use]
    pub fn contains(&self, definition_id: &str) -> bool {
        self.definitions.read().contains_key(definition_id)
    }

    /// Returns the number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    /// Returns true if no definitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }
}

fn blocking_problems(issues: &[DefinitionIssue], strict: bool) -> Vec<String> {
    issues
        .iter()
        .filter(|issue| issue.blocks_registration(strict))
        .map(ToString::to_string)
        .collect()
}

fn already_registered(definition_id: &str) -> String {
    format!("definition '{definition_id}' is already registered")
}

impl std::fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("definition_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Stage;

    #[test]
    fn test_registry_creation() {
        let registry = DefinitionRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("anything").is_none());
    }

    #[test]
    fn test_builtins_cover_each_entity_type() {
        let registry = DefinitionRegistry::with_builtins();
        assert_eq!(registry.len(), 3);

        let ids: Vec<_> = ["change-order", "document", "part"]
            .iter()
            .map(|t| {
                let defs = registry.list_for_entity_type(t);
                assert_eq!(defs.len(), 1, "expected one definition for {t}");
                defs[0].id.clone()
            })
            .collect();

        assert_eq!(
            ids,
            vec![
                CHANGE_ORDER_DEFINITION_ID.to_string(),
                DOCUMENT_REVIEW_DEFINITION_ID.to_string(),
                PART_RELEASE_DEFINITION_ID.to_string(),
            ]
        );
    }

    #[test]
    fn test_list_for_entity_type_skips_inactive() {
        let registry = DefinitionRegistry::new();
        registry
            .register(
                Definition::new("wf-old", "Old")
                    .with_entity_types(["part"])
                    .with_stage(Stage::new("s", "S", 1).with_users(["u"]))
                    .inactive(),
            )
            .unwrap();

        assert!(registry.list_for_entity_type("part").is_empty());
        assert!(registry.get("wf-old").is_some());
    }

    #[test]
    fn test_register_refuses_taken_id() {
        let registry = DefinitionRegistry::new();
        registry
            .register(Definition::new("wf", "First").with_stage(Stage::new("s", "S", 1).with_users(["u"])))
            .unwrap();

        let err = registry.register(Definition::new("wf", "Second")).unwrap_err();

        assert_eq!(err.code(), "InvalidDefinition");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("wf").unwrap().name, "First");
    }

    #[test]
    fn test_strict_registration_refuses_hollow_definitions() {
        let registry = DefinitionRegistry::new();
        let hollow = Definition::new("wf-hollow", "Hollow").with_stage(Stage::new("s", "S", 1));

        assert_eq!(
            registry.registration_problems(&hollow, true),
            vec!["stage 's' has no approver users or roles".to_string()]
        );
        assert!(registry.registration_problems(&hollow, false).is_empty());
        assert!(registry.register_with(hollow.clone(), true).is_err());
        assert!(registry.is_empty());

        registry.register(hollow.clone()).unwrap();
        assert_eq!(
            registry.registration_problems(&hollow, false),
            vec!["definition 'wf-hollow' is already registered".to_string()]
        );
    }

    #[test]
    fn test_list_is_sorted() {
        let registry = DefinitionRegistry::with_builtins();
        let ids: Vec<_> = registry.list().iter().map(|d| d.id.clone()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
