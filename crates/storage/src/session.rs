use crate::{KeyValueStore, StorageError};
use doc_model::{
    apply_script_action, Blob, DocumentMeta, NotesFeed, OverlayNotes, PageBuffer, Preferences,
    ScriptAction, ScriptState, TextFormat, VersionHistory, ViewState,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub meta: DocumentMeta,
    #[serde(default)]
    pub format: TextFormat,
    pub pages: PageBuffer,
}

pub fn blob_key(document_id: &str, blob: Blob) -> String {
    format!("{document_id}/{}", blob.key_name())
}

#[derive(Debug)]
pub struct ScriptSession<S> {
    document_id: String,
    store: S,
    state: ScriptState,
}

impl<S: KeyValueStore> ScriptSession<S> {
    /// Mounts a session, rebuilding state from whatever blobs the store holds.
    pub fn open(store: S, document_id: impl Into<String>, preferences: Preferences) -> Self {
        let document_id = document_id.into();
        let mut state = ScriptState::new(preferences);

        if let Some(record) = load_blob::<DocumentRecord>(&store, &document_id, Blob::Document) {
            state.meta = record.meta;
            state.format = record.format;
            state.pages = record.pages;
        }
        if let Some(overlay) = load_blob::<OverlayNotes>(&store, &document_id, Blob::OverlayNotes) {
            state.overlay = overlay;
        }
        if let Some(history) =
            load_blob::<VersionHistory>(&store, &document_id, Blob::VersionHistory)
        {
            state.history = history;
        }
        if let Some(feed) = load_blob::<NotesFeed>(&store, &document_id, Blob::Notes) {
            state.feed = feed;
        }
        if let Some(view) = load_blob::<ViewState>(&store, &document_id, Blob::View) {
            state.view = view;
            state.clamp_view();
        }

        debug!(%document_id, pages = state.pages.len(), "opened script session");
        Self { document_id, store, state }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn state(&self) -> &ScriptState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (S, ScriptState) {
        (self.store, self.state)
    }

    pub fn apply(&mut self, action: ScriptAction) -> bool {
        let blobs = action.blobs();
        let changed = apply_script_action(&mut self.state, action);

        if changed {
            for blob in blobs {
                self.persist(*blob);
            }
        }

        changed
    }

    pub fn apply_all(&mut self, actions: impl IntoIterator<Item = ScriptAction>) -> usize {
        let mut changed = 0;
        for action in actions {
            if self.apply(action) {
                changed += 1;
            }
        }
        changed
    }

    pub fn flush(&mut self) {
        for blob in Blob::ALL {
            self.persist(blob);
        }
    }

    fn persist(&mut self, blob: Blob) {
        let key = blob_key(&self.document_id, blob);

        if let Err(error) = self.write_blob(&key, blob) {
            warn!(%key, %error, "failed to persist blob; keeping in-memory state");
        }
    }

    fn write_blob(&mut self, key: &str, blob: Blob) -> Result<(), StorageError> {
        let value = self.blob_value(blob)?;
        self.store.save(key, &value)?;
        debug!(%key, "persisted blob");
        Ok(())
    }

    fn blob_value(&self, blob: Blob) -> Result<Value, serde_json::Error> {
        let state = &self.state;

        match blob {
            Blob::Document => serde_json::to_value(DocumentRecord {
                meta: state.meta.clone(),
                format: state.format,
                pages: state.pages.clone(),
            }),
            Blob::OverlayNotes => serde_json::to_value(&state.overlay),
            Blob::VersionHistory => serde_json::to_value(&state.history),
            Blob::Notes => serde_json::to_value(&state.feed),
            Blob::View => serde_json::to_value(state.view),
        }
    }
}

fn load_blob<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    document_id: &str,
    blob: Blob,
) -> Option<T> {
    let key = blob_key(document_id, blob);

    let value = match store.load(&key) {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(error) => {
            warn!(%key, %error, "failed to load blob; starting empty");
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            warn!(%key, %error, "malformed blob; starting empty");
            None
        }
    }
}
