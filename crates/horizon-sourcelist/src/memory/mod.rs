//! Remembered type choices.
//!
//! Every time an item's type or options are chosen, the engine records the
//! choice under the field key in a caller-chosen namespace. Adding the same
//! field again later, in any list sharing the namespace, prefers the
//! remembered type.
//!
//! [`PreferenceMemory`] is shared between engines through an `Arc` and
//! persisted through a [`PreferenceStore`] such as [`JsonPreferenceStore`].
//!
//! ```
//! use std::collections::BTreeMap;
//! use horizon_sourcelist::memory::{PreferenceEntry, PreferenceMemory};
//!
//! let memory = PreferenceMemory::shared();
//! memory.set("odometry", "/Robot/Pose", PreferenceEntry::new("ghost", BTreeMap::new()));
//!
//! let entry = memory.get("odometry", "/Robot/Pose").unwrap();
//! assert_eq!(entry.type_key, "ghost");
//! assert!(memory.get("other", "/Robot/Pose").is_none());
//! ```

mod store;

pub use store::JsonPreferenceStore;

use std::collections::BTreeMap;
use std::sync::Arc;

use horizon_sourcelist_core::Signal;
use horizon_sourcelist_core::logging::targets;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The last type and options chosen for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    #[serde(rename = "type")]
    pub type_key: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl PreferenceEntry {
    pub fn new(type_key: impl Into<String>, options: BTreeMap<String, String>) -> Self {
        Self {
            type_key: type_key.into(),
            options,
        }
    }
}

/// Namespaced entries keyed by field key.
///
/// Serializes as `{namespace: {fieldKey: {type, options}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeMemory(pub BTreeMap<String, BTreeMap<String, PreferenceEntry>>);

impl TypeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of remembered fields across all namespaces.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }
}

/// Backing store for [`PreferenceMemory`].
pub trait PreferenceStore {
    /// Loads all namespaces.
    fn load(&self) -> Result<TypeMemory>;

    /// Replaces the stored contents with `memory`.
    fn save(&self, memory: &TypeMemory) -> Result<()>;
}

/// Thread-safe, namespaced type memory.
///
/// Entries are never evicted.
pub struct PreferenceMemory {
    entries: RwLock<TypeMemory>,
    /// Emitted after an entry changed.
    /// Args: (namespace, field key)
    pub changed: Signal<(String, String)>,
}

impl Default for PreferenceMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceMemory {
    /// Creates an empty memory.
    pub fn new() -> Self {
        Self::from_memory(TypeMemory::new())
    }

    /// Creates an empty memory ready to be shared between engines.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Creates a memory holding the given entries.
    pub fn from_memory(memory: TypeMemory) -> Self {
        Self {
            entries: RwLock::new(memory),
            changed: Signal::new(),
        }
    }

    /// Returns the entry remembered for a field.
    pub fn get(&self, namespace: &str, field_key: &str) -> Option<PreferenceEntry> {
        self.entries
            .read()
            .0
            .get(namespace)
            .and_then(|fields| fields.get(field_key))
            .cloned()
    }

    /// Remembers the entry for a field, replacing any previous one.
    pub fn set(&self, namespace: &str, field_key: &str, entry: PreferenceEntry) {
        let updated = {
            let mut entries = self.entries.write();
            let fields = entries.0.entry(namespace.to_string()).or_default();
            if fields.get(field_key) == Some(&entry) {
                false
            } else {
                fields.insert(field_key.to_string(), entry);
                true
            }
        };

        if updated {
            tracing::trace!(target: targets::MEMORY, namespace, field_key, "remembered type");
            self.changed
                .emit((namespace.to_string(), field_key.to_string()));
        }
    }

    /// Returns a copy of every namespace.
    pub fn snapshot(&self) -> TypeMemory {
        self.entries.read().clone()
    }

    /// Returns the number of remembered fields.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Replaces all entries with the contents of `store`.
    pub fn load_from(&self, store: &dyn PreferenceStore) -> Result<()> {
        let loaded = store.load()?;
        tracing::debug!(target: targets::MEMORY, fields = loaded.len(), "loaded type memory");
        *self.entries.write() = loaded;
        Ok(())
    }

    /// Writes all entries to `store`.
    pub fn save_to(&self, store: &dyn PreferenceStore) -> Result<()> {
        let snapshot = self.snapshot();
        store.save(&snapshot)?;
        tracing::debug!(target: targets::MEMORY, fields = snapshot.len(), "saved type memory");
        Ok(())
    }
}

static_assertions::assert_impl_all!(PreferenceMemory: Send, Sync);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;

    fn entry(type_key: &str) -> PreferenceEntry {
        PreferenceEntry::new(
            type_key,
            BTreeMap::from([("color".to_string(), "#ff0000".to_string())]),
        )
    }

    #[test]
    fn test_namespaces_are_independent() {
        let memory = PreferenceMemory::new();
        memory.set("odometry", "/Pose", entry("robot"));
        memory.set("3d", "/Pose", entry("ghost"));

        assert_eq!(memory.get("odometry", "/Pose").unwrap().type_key, "robot");
        assert_eq!(memory.get("3d", "/Pose").unwrap().type_key, "ghost");
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_set_replaces_and_signals_changes_only() {
        let memory = PreferenceMemory::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        memory.changed.connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        memory.set("ns", "/a", entry("robot"));
        memory.set("ns", "/a", entry("robot"));
        memory.set("ns", "/a", entry("ghost"));

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(memory.get("ns", "/a").unwrap().type_key, "ghost");
        assert_eq!(memory.len(), 1);
    }

    struct VecStore(Mutex<Option<TypeMemory>>);

    impl PreferenceStore for VecStore {
        fn load(&self) -> Result<TypeMemory> {
            Ok(self.0.lock().clone().unwrap_or_default())
        }

        fn save(&self, memory: &TypeMemory) -> Result<()> {
            *self.0.lock() = Some(memory.clone());
            Ok(())
        }
    }

    #[test]
    fn test_load_and_save_through_store() {
        let store = VecStore(Mutex::new(None));
        let memory = PreferenceMemory::new();
        memory.set("ns", "/a", entry("robot"));
        memory.save_to(&store).unwrap();

        let restored = PreferenceMemory::new();
        restored.set("ns", "/stale", entry("ghost"));
        restored.load_from(&store).unwrap();
        assert_eq!(restored.snapshot(), memory.snapshot());
        assert!(restored.get("ns", "/stale").is_none());
    }

    #[test]
    fn test_wire_format() {
        let memory = PreferenceMemory::new();
        memory.set("ns", "/a", entry("robot"));
        let json = serde_json::to_value(memory.snapshot()).unwrap();
        assert_eq!(json["ns"]["/a"]["type"], "robot");
        assert_eq!(json["ns"]["/a"]["options"]["color"], "#ff0000");
    }
}
