//! Source list configuration files.

use std::path::Path;

use horizon_sourcelist_core::logging::targets;
use serde::{Deserialize, Serialize};

use super::{TypeCatalog, TypeDefinition};
use crate::error::{Error, Result};

/// The `autoAdvance` setting of a configuration.
///
/// `true` balances type usage. A string names an option key; every type
/// declaring that option balances its values unless it names its own
/// auto-advance option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AutoAdvance {
    Enabled(bool),
    Option(String),
}

impl Default for AutoAdvance {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

/// Declarative description of one source list.
///
/// # Example
///
/// ```
/// use horizon_sourcelist::catalog::SourceListConfig;
///
/// let config = SourceListConfig::from_json_str(r##"{
///     "title": "Poses",
///     "autoAdvance": "color",
///     "typeMemoryId": "odometry",
///     "types": [{
///         "key": "robot",
///         "display": "Robot",
///         "sourceTypes": ["Pose2d"],
///         "options": [{"key": "color", "values": [
///             {"key": "#ff0000", "display": "Red"},
///             {"key": "#0000ff", "display": "Blue"}
///         ]}]
///     }]
/// }"##).unwrap();
///
/// let catalog = config.to_catalog().unwrap();
/// assert_eq!(catalog.types()[0].auto_advance_option_key.as_deref(), Some("color"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceListConfig {
    pub title: String,
    #[serde(default)]
    pub auto_advance: AutoAdvance,
    /// Namespace for remembered type choices. No memory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_memory_id: Option<String>,
    pub types: Vec<TypeDefinition>,
}

impl SourceListConfig {
    /// Parses a configuration from JSON.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parses a configuration from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a configuration file, picking the format from its extension.
    ///
    /// `.toml` files are read as TOML, everything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        tracing::debug!(
            target: targets::CATALOG,
            path = %path.display(),
            is_toml,
            "loading source list config"
        );

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Builds the validated type catalog described by this configuration.
    pub fn to_catalog(&self) -> Result<TypeCatalog> {
        let (auto_advance, shared_option) = match &self.auto_advance {
            AutoAdvance::Enabled(enabled) => (*enabled, None),
            AutoAdvance::Option(key) => (false, Some(key.as_str())),
        };

        let types = self
            .types
            .iter()
            .cloned()
            .map(|mut definition| {
                if let Some(key) = shared_option
                    && definition.auto_advance_option_key.is_none()
                    && definition.option(key).is_some()
                {
                    definition.auto_advance_option_key = Some(key.to_string());
                }
                definition
            })
            .collect();

        TypeCatalog::new(types, auto_advance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_CONFIG: &str = r##"
title = "Odometry"
autoAdvance = true
typeMemoryId = "odometry"

[[types]]
key = "robot"
display = "Robot"
symbol = "robot"
color = "#222222"
darkColor = "#eeeeee"
sourceTypes = ["Pose2d", "Pose3d"]
parentKey = "robot"

[[types]]
key = "ghost"
display = "Ghost"
symbol = "ghost"
color = "color"
sourceTypes = ["Pose2d"]
childOf = "robot"

[[types.options]]
key = "color"
showInTypeName = true
values = [
    { key = "#00ff00", display = "Green" },
    { key = "#ffff00", display = "Yellow" },
]
"##;

    #[test]
    fn test_toml_config() {
        let config = SourceListConfig::from_toml_str(TOML_CONFIG).unwrap();
        assert_eq!(config.title, "Odometry");
        assert_eq!(config.auto_advance, AutoAdvance::Enabled(true));
        assert_eq!(config.type_memory_id.as_deref(), Some("odometry"));

        let catalog = config.to_catalog().unwrap();
        assert!(catalog.auto_advance());
        let ghost = catalog.get("ghost").unwrap();
        assert_eq!(ghost.child_of.as_deref(), Some("robot"));
        assert!(ghost.option("color").unwrap().show_in_type_name);
        assert_eq!(
            catalog.get("robot").unwrap().dark_color.as_deref(),
            Some("#eeeeee")
        );
    }

    #[test]
    fn test_json_defaults() {
        let config = SourceListConfig::from_json_str(
            r#"{"title": "Fields", "types": [{"key": "a", "display": "A", "sourceTypes": ["Number"]}]}"#,
        )
        .unwrap();
        assert_eq!(config.auto_advance, AutoAdvance::Enabled(false));
        assert!(config.type_memory_id.is_none());

        let definition = &config.types[0];
        assert!(!definition.is_child());
        assert!(definition.options.is_empty());
        assert!(definition.show_in_type_name);
    }

    #[test]
    fn test_loaded_type_matches_built_type() {
        let config = SourceListConfig::from_json_str(
            r#"{"title": "Fields", "types": [{"key": "a", "display": "A", "sourceTypes": ["Number"]}]}"#,
        )
        .unwrap();
        let loaded = config.to_catalog().unwrap();
        let built = TypeCatalog::new(vec![TypeDefinition::new("a", "A", ["Number"])], false).unwrap();

        assert_eq!(loaded.get("a"), built.get("a"));
        assert_eq!(loaded.get("a").unwrap().symbol, "a");
    }

    #[test]
    fn test_shared_option_keeps_explicit_choice() {
        let json = r##"{
            "title": "Fields",
            "autoAdvance": "color",
            "types": [
                {"key": "a", "display": "A", "sourceTypes": ["Number"],
                 "autoAdvanceOptionKey": "style",
                 "options": [
                    {"key": "color", "values": [{"key": "#ff0000", "display": "Red"}]},
                    {"key": "style", "values": [{"key": "solid", "display": "Solid"}]}
                 ]},
                {"key": "b", "display": "B", "sourceTypes": ["Number"]}
            ]
        }"##;
        let catalog = SourceListConfig::from_json_str(json)
            .unwrap()
            .to_catalog()
            .unwrap();

        assert!(!catalog.auto_advance());
        assert_eq!(
            catalog.get("a").unwrap().auto_advance_option_key.as_deref(),
            Some("style")
        );
        assert!(catalog.get("b").unwrap().auto_advance_option_key.is_none());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odometry.toml");
        std::fs::write(&path, TOML_CONFIG).unwrap();
        let config = SourceListConfig::load(&path).unwrap();
        assert_eq!(config.types.len(), 2);

        let missing = SourceListConfig::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(Error::Io { .. })));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let result = SourceListConfig::from_json_str("{\"title\": 3}");
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
