//! Engine configuration.

use crate::errors::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a [`WorkflowEngine`](crate::engine::WorkflowEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Count `delegated` tasks in the stage tally.
    ///
    /// Off by default: the delegatee's task stands in for the original, so
    /// an `all` stage closes once the delegatee approves.
    #[serde(default)]
    pub count_delegated_in_tally: bool,
    /// Refuse definitions with approver-less stages instead of warning.
    #[serde(default)]
    pub strict_definitions: bool,
    /// Emit notification events after each committed change.
    #[serde(default = "default_emit_events")]
    pub emit_events: bool,
    /// Register the built-in definitions at startup.
    #[serde(default = "default_load_builtins")]
    pub load_builtins: bool,
    /// Directory of JSON definition files loaded at startup.
    #[serde(default)]
    pub definitions_dir: Option<PathBuf>,
}

fn default_emit_events() -> bool {
    true
}

fn default_load_builtins() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            count_delegated_in_tally: false,
            strict_definitions: false,
            emit_events: default_emit_events(),
            load_builtins: default_load_builtins(),
            definitions_dir: None,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> WorkflowResult<Self> {
        let path = path.as_ref();
        let load_error = |reason: String| WorkflowError::Load {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| load_error(e.to_string()))
    }

    /// Sets whether delegated tasks count in the stage tally.
    #[must_use]
    pub fn with_count_delegated_in_tally(mut self, enabled: bool) -> Self {
        self.count_delegated_in_tally = enabled;
        self
    }

    /// Sets strict definition validation.
    #[must_use]
    pub fn with_strict_definitions(mut self, enabled: bool) -> Self {
        self.strict_definitions = enabled;
        self
    }

    /// Sets whether events are emitted.
    #[must_use]
    pub fn with_emit_events(mut self, enabled: bool) -> Self {
        self.emit_events = enabled;
        self
    }

    /// Sets whether the built-in definitions are registered.
    #[must_use]
    pub fn with_load_builtins(mut self, enabled: bool) -> Self {
        self.load_builtins = enabled;
        self
    }

    /// Sets the definitions directory.
    #[must_use]
    pub fn with_definitions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.definitions_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(!config.count_delegated_in_tally);
        assert!(!config.strict_definitions);
        assert!(config.emit_events);
        assert!(config.load_builtins);
        assert!(config.definitions_dir.is_none());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"strict_definitions": true}"#).unwrap();
        assert_eq!(config, EngineConfig::new().with_strict_definitions(true));
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_count_delegated_in_tally(true)
            .with_emit_events(false)
            .with_load_builtins(false)
            .with_definitions_dir("/etc/workflows");

        assert!(config.count_delegated_in_tally);
        assert!(!config.emit_events);
        assert!(!config.load_builtins);
        assert_eq!(config.definitions_dir, Some(PathBuf::from("/etc/workflows")));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"emit_events": false, "definitions_dir": "defs"}"#).unwrap();

        let config = EngineConfig::from_json_file(&path).unwrap();
        assert!(!config.emit_events);
        assert_eq!(config.definitions_dir, Some(PathBuf::from("defs")));

        std::fs::write(&path, "[]").unwrap();
        assert_eq!(EngineConfig::from_json_file(&path).unwrap_err().code(), "Load");
    }
}
