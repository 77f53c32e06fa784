use crate::history::now_millis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedNote {
    pub id: String,
    pub content: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotesFeed {
    entries: Vec<FeedNote>,
}

impl NotesFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first.
    pub fn list(&self) -> &[FeedNote] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, content: impl Into<String>) -> String {
        self.add_at(now_millis(), content)
    }

    pub fn add_at(&mut self, timestamp: u64, content: impl Into<String>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.entries.insert(0, FeedNote { id: id.clone(), content: content.into(), timestamp });
        id
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }
}
