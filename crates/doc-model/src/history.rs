use crate::meta::{DocumentMeta, DocumentType, ProjectLink};
use crate::pages::{Page, PageBuffer};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    pub timestamp: u64,
    pub title: String,
    pub pages: Vec<Page>,
    pub document_type: DocumentType,
    pub project_link: Option<ProjectLink>,
    pub custom_project_name: String,
}

impl VersionSnapshot {
    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            title: self.title.clone(),
            document_type: self.document_type,
            project_link: self.project_link.clone(),
            custom_project_name: self.custom_project_name.clone(),
        }
    }

    /// Equality ignoring capture time.
    pub fn same_content(&self, other: &VersionSnapshot) -> bool {
        self.title == other.title
            && self.pages == other.pages
            && self.document_type == other.document_type
            && self.project_link == other.project_link
            && self.custom_project_name == other.custom_project_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionHistory {
    snapshots: Vec<VersionSnapshot>,
}

impl VersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Newest first.
    pub fn list(&self) -> &[VersionSnapshot] {
        &self.snapshots
    }

    pub fn latest(&self) -> Option<&VersionSnapshot> {
        self.snapshots.first()
    }

    pub fn find(&self, timestamp: u64) -> Option<&VersionSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.timestamp == timestamp)
    }

    pub fn find_by_title(&self, title: &str) -> Option<&VersionSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.title == title)
    }

    pub fn snapshot(
        &mut self,
        meta: &DocumentMeta,
        pages: &PageBuffer,
    ) -> Option<&VersionSnapshot> {
        self.snapshot_at(now_millis(), meta, pages)
    }

    /// Records a snapshot stamped no earlier than `now_ms` and strictly later
    /// than the current newest entry. Returns `None` when no later timestamp
    /// exists.
    pub fn snapshot_at(
        &mut self,
        now_ms: u64,
        meta: &DocumentMeta,
        pages: &PageBuffer,
    ) -> Option<&VersionSnapshot> {
        let timestamp = match self.latest() {
            Some(latest) => now_ms.max(latest.timestamp.checked_add(1)?),
            None => now_ms,
        };

        self.snapshots.insert(
            0,
            VersionSnapshot {
                timestamp,
                title: meta.title.clone(),
                pages: pages.all(),
                document_type: meta.document_type,
                project_link: meta.project_link.clone(),
                custom_project_name: meta.custom_project_name.clone(),
            },
        );

        self.snapshots.first()
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
