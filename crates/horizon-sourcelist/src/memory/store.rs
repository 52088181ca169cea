//! JSON file backing for type memory.

use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use horizon_sourcelist_core::logging::targets;

use super::{PreferenceStore, TypeMemory};
use crate::error::{Error, Result};

/// File name used inside the platform data directory.
const FILE_NAME: &str = "type-memory.json";

/// Stores type memory as a pretty-printed JSON file.
///
/// Writes go to a temporary file in the target directory which is then
/// renamed over the target, so a crash never leaves a partial file behind.
/// A missing file loads as empty memory.
#[derive(Debug, Clone)]
pub struct JsonPreferenceStore {
    path: PathBuf,
}

impl JsonPreferenceStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store in the platform data directory of an application.
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn in_data_dir(qualifier: &str, organization: &str, application: &str) -> Option<Self> {
        Self::default_location(qualifier, organization, application).map(Self::new)
    }

    /// Returns the default file location for an application.
    ///
    /// - **Linux**: `~/.local/share/<application>/type-memory.json`
    /// - **macOS**: `~/Library/Application Support/<qualifier>.<organization>.<application>/type-memory.json`
    /// - **Windows**: `%APPDATA%\<organization>\<application>\data\type-memory.json`
    pub fn default_location(
        qualifier: &str,
        organization: &str,
        application: &str,
    ) -> Option<PathBuf> {
        ProjectDirs::from(qualifier, organization, application)
            .map(|dirs| dirs.data_dir().join(FILE_NAME))
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn load(&self) -> Result<TypeMemory> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    target: targets::MEMORY,
                    path = %self.path.display(),
                    "no type memory file, starting empty"
                );
                return Ok(TypeMemory::new());
            }
            Err(e) => return Err(Error::io(&self.path, e)),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, memory: &TypeMemory) -> Result<()> {
        let json = serde_json::to_string_pretty(memory)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
        temp.write_all(json.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| Error::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| Error::io(&self.path, e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::memory::{PreferenceEntry, PreferenceMemory};

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonPreferenceStore::new(dir.path().join("memory.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_directories_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonPreferenceStore::new(dir.path().join("nested").join("memory.json"));

        let memory = PreferenceMemory::new();
        memory.set("ns", "/Pose", PreferenceEntry::new("robot", BTreeMap::new()));
        memory.save_to(&store).unwrap();
        assert!(store.path().exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, memory.snapshot());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonPreferenceStore::new(&path);
        assert!(matches!(store.load(), Err(Error::Json(_))));
    }
}
