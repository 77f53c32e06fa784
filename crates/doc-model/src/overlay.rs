use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_NOTE_X: f64 = 40.0;
pub const DEFAULT_NOTE_Y: f64 = 40.0;
pub const NOTE_STAGGER: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotePosition {
    pub x: f64,
    pub y: f64,
}

impl Default for NotePosition {
    fn default() -> Self {
        Self { x: DEFAULT_NOTE_X, y: DEFAULT_NOTE_Y }
    }
}

impl NotePosition {
    pub fn new(x: f64, y: f64) -> Option<Self> {
        Self { x, y }.clamped()
    }

    pub fn offset(self, dx: f64, dy: f64) -> Option<Self> {
        Self { x: self.x + dx, y: self.y + dy }.clamped()
    }

    fn clamped(self) -> Option<Self> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }

        Some(Self { x: self.x.max(0.0), y: self.y.max(0.0) })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayNote {
    pub id: String,
    pub content: String,
    pub position: NotePosition,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub content: Option<String>,
    pub position: Option<NotePosition>,
}

impl NotePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), position: None }
    }

    pub fn position(position: NotePosition) -> Self {
        Self { content: None, position: Some(position) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayNotes {
    pages: BTreeMap<usize, Vec<OverlayNote>>,
}

impl OverlayNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes_for(&self, page_index: usize) -> &[OverlayNote] {
        self.pages.get(&page_index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn note(&self, page_index: usize, note_id: &str) -> Option<&OverlayNote> {
        self.notes_for(page_index).iter().find(|note| note.id == note_id)
    }

    pub fn pages_with_notes(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.iter().filter(|(_, notes)| !notes.is_empty()).map(|(page, _)| *page)
    }

    pub fn add_note(&mut self, page_index: usize, stagger: bool) -> String {
        let notes = self.pages.entry(page_index).or_default();

        let step = if stagger { notes.len() as f64 * NOTE_STAGGER } else { 0.0 };
        let id = uuid::Uuid::new_v4().to_string();

        notes.push(OverlayNote {
            id: id.clone(),
            content: String::new(),
            position: NotePosition::default().offset(step, step).unwrap_or_default(),
        });

        id
    }

    pub fn update_note(&mut self, page_index: usize, note_id: &str, patch: NotePatch) -> bool {
        let position = match patch.position {
            Some(position) => match position.clamped() {
                Some(position) => Some(position),
                None => return false,
            },
            None => None,
        };
        let Some(note) = self.note_mut(page_index, note_id) else {
            return false;
        };

        if let Some(content) = patch.content {
            note.content = content;
        }
        if let Some(position) = position {
            note.position = position;
        }

        true
    }

    pub fn delete_note(&mut self, page_index: usize, note_id: &str) -> bool {
        let Some(notes) = self.pages.get_mut(&page_index) else {
            return false;
        };

        let before = notes.len();
        notes.retain(|note| note.id != note_id);
        let removed = notes.len() != before;

        if notes.is_empty() {
            self.pages.remove(&page_index);
        }

        removed
    }

    pub fn move_note(&mut self, page_index: usize, note_id: &str, dx: f64, dy: f64) -> bool {
        let Some(note) = self.note_mut(page_index, note_id) else {
            return false;
        };
        let Some(position) = note.position.offset(dx, dy) else {
            return false;
        };

        note.position = position;
        true
    }

    /// Drops the notes of a removed page and re-keys later pages down by one
    /// so notes stay attached to the content they annotate.
    pub fn remove_page(&mut self, page_index: usize) {
        let pages = std::mem::take(&mut self.pages);

        self.pages = pages
            .into_iter()
            .filter(|(page, _)| *page != page_index)
            .map(|(page, notes)| if page > page_index { (page - 1, notes) } else { (page, notes) })
            .collect();
    }

    fn note_mut(&mut self, page_index: usize, note_id: &str) -> Option<&mut OverlayNote> {
        self.pages.get_mut(&page_index)?.iter_mut().find(|note| note.id == note_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down { page_index: usize, note_id: String, x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
}

/// Drag gesture for one note: `Idle -> Dragging -> Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        page_index: usize,
        note_id: String,
        origin: NotePosition,
        pointer_start: (f64, f64),
    },
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    pub fn begin(
        &mut self,
        notes: &OverlayNotes,
        page_index: usize,
        note_id: &str,
        x: f64,
        y: f64,
    ) -> bool {
        if self.is_dragging() {
            return false;
        }

        let Some(note) = notes.note(page_index, note_id) else {
            return false;
        };

        *self = Self::Dragging {
            page_index,
            note_id: note.id.clone(),
            origin: note.position,
            pointer_start: (x, y),
        };
        true
    }

    /// Feeds one pointer event and returns whether a note moved. `Up` ends
    /// the gesture wherever the pointer was released.
    pub fn handle(&mut self, notes: &mut OverlayNotes, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down { page_index, note_id, x, y } => {
                self.begin(notes, page_index, &note_id, x, y);
                false
            }
            PointerEvent::Move { x, y } => {
                let Self::Dragging { page_index, note_id, origin, pointer_start } = &*self else {
                    return false;
                };

                let Some(position) = origin.offset(x - pointer_start.0, y - pointer_start.1)
                else {
                    return false;
                };
                notes.update_note(*page_index, note_id, NotePatch::position(position))
            }
            PointerEvent::Up => {
                *self = Self::Idle;
                false
            }
        }
    }
}
