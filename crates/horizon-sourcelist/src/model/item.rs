//! List items and their derived structural roles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Stable identity of an item, independent of its position in the list.
    pub struct ItemId;
}

/// One field bound into a source list.
///
/// The serialized form is the persisted list state:
///
/// ```
/// use horizon_sourcelist::model::ListItem;
///
/// let item: ListItem = serde_json::from_str(
///     r#"{"type": "robot", "logKey": "/Odometry", "logType": "Pose2d", "visible": true, "options": {}}"#,
/// ).unwrap();
/// assert_eq!(item.type_key, "robot");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    /// Key of the item's type in the catalog.
    #[serde(rename = "type")]
    pub type_key: String,
    /// Key of the bound field.
    pub log_key: String,
    /// Source kind the type was resolved against.
    pub log_type: String,
    pub visible: bool,
    /// Selected value key per option key.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ListItem {
    /// Creates a visible item with no options selected.
    pub fn new(
        type_key: impl Into<String>,
        log_key: impl Into<String>,
        log_type: impl Into<String>,
    ) -> Self {
        Self {
            type_key: type_key.into(),
            log_key: log_key.into(),
            log_type: log_type.into(),
            visible: true,
            options: BTreeMap::new(),
        }
    }

    /// Sets an option value.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Structural role of an item, derived from its type and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralRole {
    /// Neither heads nor belongs to a child block.
    Standalone,
    /// Heads a (possibly empty) child block.
    Parent,
    /// Belongs to the child block of the closest preceding parent.
    Child,
}

impl StructuralRole {
    pub fn is_child(self) -> bool {
        matches!(self, StructuralRole::Child)
    }

    pub fn is_parent(self) -> bool {
        matches!(self, StructuralRole::Parent)
    }
}
