pub mod feed;
pub mod history;
pub mod meta;
pub mod overlay;
pub mod pages;
pub mod tools;

pub use feed::{FeedNote, NotesFeed};
pub use history::{VersionHistory, VersionSnapshot};
pub use meta::{Alignment, DocumentMeta, DocumentType, ParseError, ProjectLink, TextFormat};
pub use overlay::{DragState, NotePatch, NotePosition, OverlayNote, OverlayNotes, PointerEvent};
pub use pages::{Page, PageBuffer};
pub use tools::{apply_tool, WriterTool};
pub use viewer_core::{ShiftDirection, ViewMode, ViewState};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub default_view_mode: ViewMode,
    pub stagger_new_notes: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self { default_view_mode: ViewMode::Single, stagger_new_notes: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Blob {
    Document,
    OverlayNotes,
    VersionHistory,
    Notes,
    View,
}

impl Blob {
    pub const ALL: [Blob; 5] =
        [Blob::Document, Blob::OverlayNotes, Blob::VersionHistory, Blob::Notes, Blob::View];

    pub fn key_name(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::OverlayNotes => "overlayNotes",
            Self::VersionHistory => "versionHistory",
            Self::Notes => "notes",
            Self::View => "view",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptState {
    pub meta: DocumentMeta,
    pub format: TextFormat,
    pub pages: PageBuffer,
    pub overlay: OverlayNotes,
    pub view: ViewState,
    pub history: VersionHistory,
    pub feed: NotesFeed,
    #[serde(skip)]
    pub drag: DragState,
    #[serde(skip)]
    pub preferences: Preferences,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}

impl ScriptState {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            meta: DocumentMeta::default(),
            format: TextFormat::default(),
            pages: PageBuffer::new(),
            overlay: OverlayNotes::new(),
            view: ViewState::new(preferences.default_view_mode),
            history: VersionHistory::new(),
            feed: NotesFeed::new(),
            drag: DragState::Idle,
            preferences,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn visible_pages(&self) -> std::ops::Range<usize> {
        viewer_core::visible_pages(&self.view, self.pages.len())
    }

    /// Pulls the view back into range after the page count changed underneath it.
    pub fn clamp_view(&mut self) {
        viewer_core::clamp_to_page_count(&mut self.view, self.pages.len());
    }

    pub fn can_shift(&self, direction: ShiftDirection) -> bool {
        viewer_core::can_shift(&self.view, direction, self.pages.len())
    }

    pub fn capture(&self) -> VersionSnapshot {
        VersionSnapshot {
            timestamp: 0,
            title: self.meta.title.clone(),
            pages: self.pages.all(),
            document_type: self.meta.document_type,
            project_link: self.meta.project_link.clone(),
            custom_project_name: self.meta.custom_project_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptAction {
    AddPage,
    DeletePage { page: usize },
    UpdatePageContent { page: usize, text: String },
    AddNote { page: usize },
    UpdateNote { page: usize, note_id: String, patch: NotePatch },
    DeleteNote { page: usize, note_id: String },
    MoveNote { page: usize, note_id: String, dx: f64, dy: f64 },
    Pointer(PointerEvent),
    SetViewMode(ViewMode),
    Shift(ShiftDirection),
    SelectPage { page: usize },
    ApplyTool { text: String },
    SetTitle(String),
    SetDocumentType(DocumentType),
    SetProjectLink(Option<ProjectLink>),
    SetCustomProjectName(String),
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    SetAlignment(Alignment),
    /// Records a snapshot; `title` renames the document first when given.
    SaveVersion { title: Option<String> },
    RestoreVersion { timestamp: u64 },
    AddFeedNote { content: String },
    DeleteFeedNote { id: String },
}

impl ScriptAction {
    pub fn blobs(&self) -> &'static [Blob] {
        match self {
            Self::AddPage
            | Self::UpdatePageContent { .. }
            | Self::ApplyTool { .. }
            | Self::SetTitle(_)
            | Self::SetDocumentType(_)
            | Self::SetProjectLink(_)
            | Self::SetCustomProjectName(_)
            | Self::ToggleBold
            | Self::ToggleItalic
            | Self::ToggleUnderline
            | Self::SetAlignment(_) => &[Blob::Document],
            Self::DeletePage { .. } => &[Blob::Document, Blob::OverlayNotes, Blob::View],
            Self::AddNote { .. }
            | Self::UpdateNote { .. }
            | Self::DeleteNote { .. }
            | Self::MoveNote { .. }
            | Self::Pointer(_) => &[Blob::OverlayNotes],
            Self::SetViewMode(_) | Self::Shift(_) | Self::SelectPage { .. } => &[Blob::View],
            Self::SaveVersion { .. } => &[Blob::Document, Blob::VersionHistory],
            Self::RestoreVersion { .. } => &[Blob::Document, Blob::View],
            Self::AddFeedNote { .. } | Self::DeleteFeedNote { .. } => &[Blob::Notes],
        }
    }
}

/// Applies one action and reports whether anything changed. Stale page
/// indices, unknown note ids and unknown snapshots leave the state as is.
pub fn apply_script_action(state: &mut ScriptState, action: ScriptAction) -> bool {
    debug!(?action, "applying script action");

    match action {
        ScriptAction::AddPage => {
            state.pages.add_page();
            true
        }
        ScriptAction::DeletePage { page } => {
            if !state.pages.delete_page(page) {
                return false;
            }

            state.overlay.remove_page(page);
            state.clamp_view();
            true
        }
        ScriptAction::UpdatePageContent { page, text } => {
            state.pages.update_page_content(page, text)
        }
        ScriptAction::AddNote { page } => {
            if page >= state.pages.len() {
                return false;
            }

            state.overlay.add_note(page, state.preferences.stagger_new_notes);
            true
        }
        ScriptAction::UpdateNote { page, note_id, patch } => {
            state.overlay.update_note(page, &note_id, patch)
        }
        ScriptAction::DeleteNote { page, note_id } => state.overlay.delete_note(page, &note_id),
        ScriptAction::MoveNote { page, note_id, dx, dy } => {
            state.overlay.move_note(page, &note_id, dx, dy)
        }
        ScriptAction::Pointer(event) => state.drag.handle(&mut state.overlay, event),
        ScriptAction::SetViewMode(mode) => {
            viewer_core::set_mode(&mut state.view, mode);
            true
        }
        ScriptAction::Shift(direction) => {
            viewer_core::shift(&mut state.view, direction, state.pages.len())
        }
        ScriptAction::SelectPage { page } => {
            viewer_core::select_page(&mut state.view, page, state.pages.len())
        }
        ScriptAction::ApplyTool { text } => {
            !apply_tool(&mut state.pages, &state.view, &text).is_empty()
        }
        ScriptAction::SetTitle(title) => replace(&mut state.meta.title, title),
        ScriptAction::SetDocumentType(document_type) => {
            replace(&mut state.meta.document_type, document_type)
        }
        ScriptAction::SetProjectLink(link) => replace(&mut state.meta.project_link, link),
        ScriptAction::SetCustomProjectName(name) => {
            replace(&mut state.meta.custom_project_name, name)
        }
        ScriptAction::ToggleBold => {
            state.format.bold = !state.format.bold;
            true
        }
        ScriptAction::ToggleItalic => {
            state.format.italic = !state.format.italic;
            true
        }
        ScriptAction::ToggleUnderline => {
            state.format.underline = !state.format.underline;
            true
        }
        ScriptAction::SetAlignment(alignment) => replace(&mut state.format.alignment, alignment),
        ScriptAction::SaveVersion { title } => {
            let mut meta = state.meta.clone();
            if let Some(title) = title {
                meta.title = title;
            }

            let Some(snapshot) = state.history.snapshot(&meta, &state.pages) else {
                warn!("version history has no later timestamp; save skipped");
                return false;
            };
            info!(timestamp = snapshot.timestamp, title = %snapshot.title, "saved version");
            state.meta = meta;
            true
        }
        ScriptAction::RestoreVersion { timestamp } => {
            let Some(snapshot) = state.history.find(timestamp) else {
                return false;
            };

            state.pages.replace_all(snapshot.pages.clone());
            state.meta = snapshot.meta();
            state.clamp_view();
            info!(timestamp, title = %state.meta.title, "restored version");
            true
        }
        ScriptAction::AddFeedNote { content } => {
            state.feed.add(content);
            true
        }
        ScriptAction::DeleteFeedNote { id } => state.feed.delete(&id),
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }

    *slot = value;
    true
}
