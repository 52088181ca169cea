//! Declarative catalog of item types.
//!
//! A [`TypeCatalog`] describes which presentation types a source list can
//! hold, which source kinds each type accepts, which options it carries and
//! how types group into parents and children. The catalog is immutable once
//! built; every query is a pure function of the catalog and its inputs.
//!
//! # Parent/Child Grouping
//!
//! A type that declares `parentKey` can head a group. A type that declares
//! `childOf` may only be added directly after an item whose type's
//! `parentKey` equals that `childOf`:
//!
//! ```
//! use horizon_sourcelist::catalog::{TypeCatalog, TypeDefinition};
//!
//! let robot = TypeDefinition::new("robot", "Robot", ["Pose2d"]).with_parent_key("robot");
//! let ghost = TypeDefinition::new("ghost", "Ghost", ["Pose2d"]).with_child_of("robot");
//! let catalog = TypeCatalog::new(vec![robot, ghost], false).unwrap();
//!
//! let top_level = catalog.resolve_candidates("Pose2d", None);
//! assert_eq!(top_level[0].key, "robot");
//!
//! let children = catalog.resolve_candidates("Pose2d", Some("robot"));
//! assert_eq!(children[0].key, "ghost");
//! ```

mod config;

pub use config::{AutoAdvance, SourceListConfig};

use std::collections::{BTreeSet, HashMap, HashSet};

use horizon_sourcelist_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One selectable value of an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValue {
    pub key: String,
    pub display: String,
}

impl OptionValue {
    /// Creates a value whose display text equals its key.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            display: key.clone(),
            key,
        }
    }
}

/// An option carried by every item of a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDefinition {
    pub key: String,
    #[serde(default)]
    pub display: String,
    pub values: Vec<OptionValue>,
    /// Whether the selected value shows up in the item's type name.
    #[serde(default)]
    pub show_in_type_name: bool,
}

impl OptionDefinition {
    /// Creates an option from value keys, in declaration order.
    pub fn new<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        Self {
            display: key.clone(),
            key,
            values: values.into_iter().map(OptionValue::new).collect(),
            show_in_type_name: false,
        }
    }

    /// Sets whether the selected value shows up in the type name.
    pub fn with_show_in_type_name(mut self, show: bool) -> Self {
        self.show_in_type_name = show;
        self
    }

    /// Returns the first declared value key.
    ///
    /// Catalog validation guarantees that every option has one.
    pub fn default_value(&self) -> &str {
        self.values.first().map(|v| v.key.as_str()).unwrap_or_default()
    }

    /// Returns true if `value` belongs to the declared value set.
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.key == value)
    }

    /// Returns the declared value with the given key.
    pub fn value(&self, value: &str) -> Option<&OptionValue> {
        self.values.iter().find(|v| v.key == value)
    }
}

/// How the icon color of a type is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpec<'a> {
    /// A fixed color, with an optional dark-theme variant.
    Literal { light: &'a str, dark: Option<&'a str> },
    /// The item's selected value of the named option.
    Option(&'a str),
}

/// The declaration of one item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub key: String,
    pub display: String,
    /// Icon name, the type key when left empty.
    #[serde(default)]
    pub symbol: String,
    /// A `#rrggbb` literal or the key of one of this type's options.
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_color: Option<String>,
    /// Accepted source kinds.
    #[serde(rename = "sourceTypes")]
    pub source_kinds: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
    /// Option whose value is balanced across items of this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_advance_option_key: Option<String>,
    /// Whether the type display leads the item's type name.
    #[serde(default = "default_show_in_type_name")]
    pub show_in_type_name: bool,
    /// Source kind that still works with this type but is deprecated for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated_for_source_kind: Option<String>,
}

fn default_color() -> String {
    "#000000".to_string()
}

fn default_show_in_type_name() -> bool {
    true
}

impl TypeDefinition {
    /// Creates a standalone type accepting the given source kinds.
    pub fn new<I, S>(key: impl Into<String>, display: impl Into<String>, source_kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        Self {
            symbol: key.clone(),
            key,
            display: display.into(),
            color: default_color(),
            dark_color: None,
            source_kinds: source_kinds.into_iter().map(Into::into).collect(),
            child_of: None,
            parent_key: None,
            options: Vec::new(),
            auto_advance_option_key: None,
            show_in_type_name: true,
            deprecated_for_source_kind: None,
        }
    }

    /// Marks the type as a parent for child types declaring `childOf == key`.
    pub fn with_parent_key(mut self, key: impl Into<String>) -> Self {
        self.parent_key = Some(key.into());
        self
    }

    /// Marks the type as a child of parents declaring `parentKey == key`.
    pub fn with_child_of(mut self, key: impl Into<String>) -> Self {
        self.child_of = Some(key.into());
        self
    }

    /// Appends an option.
    pub fn with_option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }

    /// Sets the option whose value is balanced across items of this type.
    pub fn with_auto_advance_option(mut self, key: impl Into<String>) -> Self {
        self.auto_advance_option_key = Some(key.into());
        self
    }

    /// Sets the icon color (a literal or an option key).
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Sets the source kind this type is deprecated for.
    pub fn with_deprecated_source_kind(mut self, kind: impl Into<String>) -> Self {
        self.deprecated_for_source_kind = Some(kind.into());
        self
    }

    /// Returns true if items of this type must live in a parent's child block.
    pub fn is_child(&self) -> bool {
        self.child_of.is_some()
    }

    /// Returns true if items of this type head a child block.
    pub fn is_parent(&self) -> bool {
        self.parent_key.is_some()
    }

    /// Returns true if the type accepts the source kind.
    pub fn accepts(&self, source_kind: &str) -> bool {
        self.source_kinds.contains(source_kind)
    }

    /// Returns the option with the given key.
    pub fn option(&self, key: &str) -> Option<&OptionDefinition> {
        self.options.iter().find(|o| o.key == key)
    }

    /// Returns how the icon color is chosen.
    pub fn color_spec(&self) -> ColorSpec<'_> {
        if self.color.starts_with('#') {
            ColorSpec::Literal {
                light: &self.color,
                dark: self.dark_color.as_deref(),
            }
        } else {
            ColorSpec::Option(&self.color)
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.key.as_str()) {
                return Err(Error::invalid_catalog(format!(
                    "type \"{}\" declares option \"{}\" twice",
                    self.key, option.key
                )));
            }
            if option.values.is_empty() {
                return Err(Error::invalid_catalog(format!(
                    "option \"{}\" of type \"{}\" has no values",
                    option.key, self.key
                )));
            }
        }
        if let Some(key) = &self.auto_advance_option_key
            && self.option(key).is_none()
        {
            return Err(Error::invalid_catalog(format!(
                "auto-advance option \"{key}\" is not an option of type \"{}\"",
                self.key
            )));
        }
        if let ColorSpec::Option(key) = self.color_spec()
            && self.option(key).is_none()
        {
            return Err(Error::invalid_catalog(format!(
                "color option \"{key}\" is not an option of type \"{}\"",
                self.key
            )));
        }
        Ok(())
    }
}

/// An immutable, validated set of type definitions.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    types: Vec<TypeDefinition>,
    auto_advance: bool,
    by_key: HashMap<String, usize>,
    /// Source kinds accepted by at least one type that is not a child.
    independent_kinds: BTreeSet<String>,
}

impl TypeCatalog {
    /// Builds a catalog, validating every definition.
    ///
    /// With `auto_advance` set, new items prefer the least used compatible
    /// type instead of the first declared one.
    pub fn new(mut types: Vec<TypeDefinition>, auto_advance: bool) -> Result<Self> {
        let mut by_key = HashMap::with_capacity(types.len());
        let mut independent_kinds = BTreeSet::new();

        for (index, definition) in types.iter_mut().enumerate() {
            definition.validate()?;
            if definition.symbol.is_empty() {
                definition.symbol = definition.key.clone();
            }
            if by_key.insert(definition.key.clone(), index).is_some() {
                return Err(Error::invalid_catalog(format!(
                    "type \"{}\" is declared twice",
                    definition.key
                )));
            }
            if !definition.is_child() {
                independent_kinds.extend(definition.source_kinds.iter().cloned());
            }
        }

        tracing::debug!(
            target: targets::CATALOG,
            types = types.len(),
            auto_advance,
            "built type catalog"
        );

        Ok(Self {
            types,
            auto_advance,
            by_key,
            independent_kinds,
        })
    }

    /// Returns all definitions in declaration order.
    pub fn types(&self) -> &[TypeDefinition] {
        &self.types
    }

    /// Returns true if new items balance type usage.
    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    /// Looks up a definition by key.
    pub fn get(&self, type_key: &str) -> Option<&TypeDefinition> {
        self.by_key.get(type_key).map(|&index| &self.types[index])
    }

    /// Looks up a definition by key, failing on unknown keys.
    pub fn require(&self, type_key: &str) -> Result<&TypeDefinition> {
        self.get(type_key).ok_or_else(|| Error::unknown_type(type_key))
    }

    /// Returns the parent key declared by a type, if any.
    pub fn parent_key(&self, type_key: &str) -> Option<&str> {
        self.get(type_key).and_then(|t| t.parent_key.as_deref())
    }

    /// Returns true if the type exists and is a child type.
    pub fn is_child_type(&self, type_key: &str) -> bool {
        self.get(type_key).is_some_and(TypeDefinition::is_child)
    }

    /// Source kinds that can be added outside of any parent.
    pub fn independent_source_kinds(&self) -> &BTreeSet<String> {
        &self.independent_kinds
    }

    /// Source kinds that can be added as children of a parent key.
    pub fn child_source_kinds(&self, parent_key: &str) -> BTreeSet<&str> {
        self.types
            .iter()
            .filter(|t| t.child_of.as_deref() == Some(parent_key))
            .flat_map(|t| t.source_kinds.iter().map(String::as_str))
            .collect()
    }

    /// Returns every type accepting `source_kind` in the given context.
    ///
    /// Without a parent context only types that are not children qualify;
    /// with one, only types whose `childOf` equals it. Declaration order is
    /// kept.
    pub fn resolve_candidates(
        &self,
        source_kind: &str,
        parent_context: Option<&str>,
    ) -> Vec<&TypeDefinition> {
        self.types
            .iter()
            .filter(|t| t.child_of.as_deref() == parent_context && t.accepts(source_kind))
            .collect()
    }

    /// Returns true if some type accepts `source_kind` in the given context.
    pub fn accepts_in_context(&self, source_kind: &str, parent_context: Option<&str>) -> bool {
        self.types
            .iter()
            .any(|t| t.child_of.as_deref() == parent_context && t.accepts(source_kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TypeCatalog {
        TypeCatalog::new(
            vec![
                TypeDefinition::new("robot", "Robot", ["Pose2d", "NumberArray"])
                    .with_parent_key("robot"),
                TypeDefinition::new("ghost", "Ghost", ["Pose2d"]).with_child_of("robot"),
                TypeDefinition::new("vision", "Vision", ["Translation2d[]"]).with_child_of("robot"),
                TypeDefinition::new("trajectory", "Trajectory", ["Pose2d[]"]),
                TypeDefinition::new("heatmap", "Heatmap", ["Pose2d"]),
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_candidates_top_level() {
        let catalog = catalog();
        let keys: Vec<&str> = catalog
            .resolve_candidates("Pose2d", None)
            .iter()
            .map(|t| t.key.as_str())
            .collect();
        assert_eq!(keys, vec!["robot", "heatmap"]);
    }

    #[test]
    fn test_resolve_candidates_child_context() {
        let catalog = catalog();
        let keys: Vec<&str> = catalog
            .resolve_candidates("Pose2d", Some("robot"))
            .iter()
            .map(|t| t.key.as_str())
            .collect();
        assert_eq!(keys, vec!["ghost"]);
        assert!(catalog.resolve_candidates("Pose2d", Some("other")).is_empty());
        assert!(catalog.resolve_candidates("Boolean", None).is_empty());
    }

    #[test]
    fn test_derived_kind_sets() {
        let catalog = catalog();
        let independent: Vec<&str> = catalog
            .independent_source_kinds()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(independent, vec!["NumberArray", "Pose2d", "Pose2d[]"]);

        let children = catalog.child_source_kinds("robot");
        assert!(children.contains("Pose2d"));
        assert!(children.contains("Translation2d[]"));
        assert_eq!(children.len(), 2);
        assert_eq!(catalog.parent_key("robot"), Some("robot"));
        assert_eq!(catalog.parent_key("ghost"), None);
        assert!(catalog.is_child_type("vision"));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let catalog = catalog();
        assert!(matches!(
            catalog.require("swerve"),
            Err(Error::UnknownType { type_key }) if type_key == "swerve"
        ));
    }

    #[test]
    fn test_validation_rejects_duplicate_keys() {
        let result = TypeCatalog::new(
            vec![
                TypeDefinition::new("a", "A", ["Number"]),
                TypeDefinition::new("a", "A again", ["Number"]),
            ],
            false,
        );
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_validation_rejects_empty_option() {
        let empty = OptionDefinition::new("format", Vec::<String>::new());
        let result = TypeCatalog::new(
            vec![TypeDefinition::new("a", "A", ["Number"]).with_option(empty)],
            false,
        );
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_validation_rejects_dangling_option_references() {
        let auto = TypeDefinition::new("a", "A", ["Number"]).with_auto_advance_option("format");
        assert!(TypeCatalog::new(vec![auto], false).is_err());

        let color = TypeDefinition::new("a", "A", ["Number"]).with_color("color");
        assert!(TypeCatalog::new(vec![color], false).is_err());

        let valid = TypeDefinition::new("a", "A", ["Number"])
            .with_option(OptionDefinition::new("color", ["#ff0000", "#0000ff"]))
            .with_color("color");
        assert!(TypeCatalog::new(vec![valid], false).is_ok());
    }

    #[test]
    fn test_color_spec() {
        let literal = TypeDefinition::new("a", "A", ["Number"]).with_color("#123456");
        assert_eq!(
            literal.color_spec(),
            ColorSpec::Literal {
                light: "#123456",
                dark: None
            }
        );
        let driven = TypeDefinition::new("a", "A", ["Number"]).with_color("color");
        assert_eq!(driven.color_spec(), ColorSpec::Option("color"));
    }
}
