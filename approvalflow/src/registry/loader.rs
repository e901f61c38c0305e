//! Loading definitions from JSON files.
//!
//! A file holds either one definition object or an array of them. Files in a
//! directory are loaded independently: a broken file is reported and skipped
//! without preventing the others from loading.

use super::DefinitionRegistry;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::model::Definition;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of loading one file from a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    /// A definition was registered.
    Loaded {
        /// The definition id.
        id: String,
        /// The source file.
        path: PathBuf,
    },
    /// A file failed to load.
    Error {
        /// The source file.
        path: PathBuf,
        /// Why it failed.
        error: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    Many(Vec<Definition>),
    One(Box<Definition>),
}

impl DefinitionRegistry {
    /// Loads and registers the definitions in a JSON file.
    ///
    /// Nothing is registered if the file cannot be parsed or any of its
    /// definitions would be refused by [`DefinitionRegistry::register_with`].
    pub fn load_json_file(
        &self,
        path: impl AsRef<Path>,
        strict: bool,
    ) -> WorkflowResult<Vec<Arc<Definition>>> {
        let path = path.as_ref();
        debug!("Loading workflow definitions from {}", path.display());

        let load_error = |reason: String| WorkflowError::Load {
            path: path.display().to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let parsed: DefinitionFile =
            serde_json::from_str(&raw).map_err(|e| load_error(e.to_string()))?;
        let definitions = match parsed {
            DefinitionFile::Many(defs) => defs,
            DefinitionFile::One(def) => vec![*def],
        };

        let mut seen = HashSet::new();
        for definition in &definitions {
            let mut problems = self.registration_problems(definition, strict);
            if !seen.insert(definition.id.as_str()) {
                problems.push(format!("definition '{}' appears twice in the file", definition.id));
            }
            if !problems.is_empty() {
                return Err(WorkflowError::InvalidDefinition {
                    definition_id: definition.id.clone(),
                    problems,
                });
            }
        }

        definitions
            .into_iter()
            .map(|definition| self.register_with(definition, strict))
            .collect()
    }

    /// Loads every `*.json` file in a directory, in file-name order.
    ///
    /// A refused file is reported as [`LoadEvent::Error`]; the others still load.
    pub fn load_json_dir(&self, dir: impl AsRef<Path>, strict: bool) -> WorkflowResult<Vec<LoadEvent>> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| WorkflowError::Load {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut events = Vec::new();
        for path in paths {
            match self.load_json_file(&path, strict) {
                Ok(definitions) => {
                    events.extend(definitions.iter().map(|d| LoadEvent::Loaded {
                        id: d.id.clone(),
                        path: path.clone(),
                    }));
                }
                Err(e) => {
                    warn!("Failed to load {}: {}", path.display(), e);
                    events.push(LoadEvent::Error {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Loaded {} workflow definitions from {}",
            events
                .iter()
                .filter(|e| matches!(e, LoadEvent::Loaded { .. }))
                .count(),
            dir.display()
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SINGLE: &str = r#"{
        "id": "wf-release",
        "name": "Release Approval",
        "entity_types": ["release"],
        "stages": [
            {"id": "qa", "name": "QA", "sequence": 1, "approver_roles": ["qa"], "aggregation": "any"},
            {"id": "mgmt", "name": "Management", "sequence": 2, "approver_users": ["cto"]}
        ]
    }"#;

    #[test]
    fn test_load_single_definition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release.json");
        fs::write(&path, SINGLE).unwrap();

        let registry = DefinitionRegistry::new();
        let loaded = registry.load_json_file(&path, false).unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(registry.list_for_entity_type("release").len(), 1);
        let def = registry.get("wf-release").unwrap();
        assert_eq!(def.next_stage("qa").map(|s| s.id.as_str()), Some("mgmt"));
    }

    #[test]
    fn test_load_array_of_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("many.json");
        fs::write(
            &path,
            r#"[{"id": "a", "name": "A"}, {"id": "b", "name": "B", "is_active": false}]"#,
        )
        .unwrap();

        let registry = DefinitionRegistry::new();
        registry.load_json_file(&path, false).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(!registry.get("b").unwrap().is_active);
    }

    #[test]
    fn test_fatal_issue_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.json");
        fs::write(
            &path,
            r#"{"id": "dup", "name": "Dup", "stages": [
                {"id": "s", "name": "One", "sequence": 1, "approver_users": ["u"]},
                {"id": "s", "name": "Two", "sequence": 2, "approver_users": ["u"]}
            ]}"#,
        )
        .unwrap();

        let registry = DefinitionRegistry::new();
        let err = registry.load_json_file(&path, false).unwrap_err();

        assert_eq!(err.code(), "InvalidDefinition");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_dir_reports_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_release.json"), SINGLE).unwrap();
        fs::write(dir.path().join("b_broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = DefinitionRegistry::new();
        let events = registry.load_json_dir(dir.path(), false).unwrap();

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], LoadEvent::Loaded { id, .. } if id == "wf-release"));
        assert!(matches!(&events[1], LoadEvent::Error { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let registry = DefinitionRegistry::new();
        let err = registry.load_json_file("/definitely/not/here.json", false).unwrap_err();
        assert_eq!(err.code(), "Load");
    }

    #[test]
    fn test_taken_id_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a_release.json");
        let second = dir.path().join("b_release_again.json");
        fs::write(&first, SINGLE).unwrap();
        fs::write(&second, SINGLE.replace("Release Approval", "Release Approval v2")).unwrap();

        let registry = DefinitionRegistry::new();
        let events = registry.load_json_dir(dir.path(), false).unwrap();

        assert!(matches!(&events[0], LoadEvent::Loaded { id, .. } if id == "wf-release"));
        assert!(matches!(&events[1], LoadEvent::Error { error, .. } if error.contains("already registered")));
        assert_eq!(registry.get("wf-release").unwrap().name, "Release Approval");
    }

    #[test]
    fn test_repeated_id_in_one_file_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.json");
        fs::write(&path, r#"[{"id": "a", "name": "A"}, {"id": "a", "name": "A again"}]"#).unwrap();

        let registry = DefinitionRegistry::new();
        let err = registry.load_json_file(&path, false).unwrap_err();

        assert_eq!(err.code(), "InvalidDefinition");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_strict_load_refuses_hollow_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hollow.json");
        fs::write(
            &path,
            r#"{"id": "wf-hollow", "name": "Hollow", "stages": [{"id": "s", "name": "S", "sequence": 1}]}"#,
        )
        .unwrap();

        let registry = DefinitionRegistry::new();
        assert!(registry.load_json_file(&path, true).is_err());
        assert!(registry.is_empty());

        registry.load_json_file(&path, false).unwrap();
        assert!(registry.contains("wf-hollow"));
    }
}
