mod session;

pub use session::{blob_key, DocumentRecord, ScriptSession};

use directories::ProjectDirs;
use doc_model::Preferences;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const PREFS_SCHEMA_VERSION: u32 = 1;
const DOCUMENTS_DIR: &str = "documents";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Key-value persistence for JSON blobs. `load` yields `None` for keys that
/// were never written.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn save(&mut self, key: &str, value: &Value) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.clone());
        Ok(())
    }
}

/// Stores each key as `<root>/documents/<key>.json`; `/` in a key becomes a
/// directory. Preferences live beside `documents/` at the root.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PreferencesEnvelope {
    version: u32,
    preferences: Preferences,
}

impl FileStore {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "ScriptDesk", "ScriptDesk")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_preferences(&self) -> Result<Preferences, StorageError> {
        let path = self.preferences_path();
        if !path.exists() {
            return Ok(Preferences::default());
        }

        let bytes = fs::read(path)?;
        let envelope: PreferencesEnvelope = serde_json::from_slice(&bytes)?;

        Ok(envelope.preferences)
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let envelope =
            PreferencesEnvelope { version: PREFS_SCHEMA_VERSION, preferences: preferences.clone() };

        let bytes = serde_json::to_vec_pretty(&envelope)?;
        write_atomic(&self.preferences_path(), &bytes)
    }

    fn preferences_path(&self) -> PathBuf {
        self.root.join("preferences.json")
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let segments: Vec<&str> = key.split('/').collect();
        let invalid = |segment: &&str| {
            segment.is_empty() || *segment == "." || *segment == ".." || segment.contains('\\')
        };

        if segments.iter().any(invalid) {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }

        let mut path = self.root.join(DOCUMENTS_DIR);
        if let Some((last, parents)) = segments.split_last() {
            path.extend(parents);
            path.push(format!("{last}.json"));
        }

        Ok(path)
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec_pretty(value)?;
        write_atomic(&path, &bytes)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::ViewMode;
    use serde_json::json;

    #[test]
    fn preferences_round_trip() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = FileStore::with_root(temp.path());

        let prefs = Preferences { default_view_mode: ViewMode::Quad, stagger_new_notes: true };

        store.save_preferences(&prefs).expect("save should succeed");
        let loaded = store.load_preferences().expect("load should succeed");

        assert_eq!(loaded, prefs);
    }

    #[test]
    fn load_defaults_when_file_absent() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = FileStore::with_root(temp.path());

        let loaded = store.load_preferences().expect("load should succeed");
        assert_eq!(loaded, Preferences::default());
    }

    #[test]
    fn blobs_round_trip_through_nested_keys() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let mut store = FileStore::with_root(temp.path());

        let value = json!({
            "0": [{ "id": "n1", "content": "", "position": { "x": 40.0, "y": 40.0 } }]
        });
        store.save("script-1/overlayNotes", &value).expect("save should succeed");

        let expected = temp.path().join("documents").join("script-1").join("overlayNotes.json");
        assert!(expected.exists());
        let loaded = store.load("script-1/overlayNotes").expect("load should succeed");
        assert_eq!(loaded, Some(value));
    }

    #[test]
    fn missing_blob_loads_as_none() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = FileStore::with_root(temp.path());

        assert!(store.load("script-1/notes").expect("load should succeed").is_none());
    }

    #[test]
    fn traversal_keys_are_rejected() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let mut store = FileStore::with_root(temp.path());

        for key in ["../escape", "a//b", "", "a/./b"] {
            let result = store.save(key, &json!(null));
            assert!(matches!(result, Err(StorageError::InvalidKey(_))), "key {key:?}");
        }
    }

    #[test]
    fn corrupt_blob_surfaces_serde_error() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = FileStore::with_root(temp.path());

        let doc_dir = temp.path().join("documents").join("doc");
        fs::create_dir_all(&doc_dir).expect("dir should be created");
        fs::write(doc_dir.join("notes.json"), b"{not json").expect("write should succeed");

        assert!(matches!(store.load("doc/notes"), Err(StorageError::Serde(_))));
    }

    #[test]
    fn document_named_like_preferences_file_does_not_shadow_it() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let mut store = FileStore::with_root(temp.path());

        store.save("preferences.json/view", &json!({})).expect("save should succeed");
        let prefs = Preferences { default_view_mode: ViewMode::All, stagger_new_notes: false };
        store.save_preferences(&prefs).expect("preferences should still save");

        assert_eq!(store.load_preferences().expect("load should succeed"), prefs);
    }

    #[test]
    fn memory_store_returns_saved_values() {
        let mut store = MemoryStore::new();
        store.save("k", &json!([1, 2])).expect("save should succeed");

        assert_eq!(store.load("k").expect("load should succeed"), Some(json!([1, 2])));
        assert_eq!(store.load("other").expect("load should succeed"), None);
    }
}
