use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Single,
    Double,
    Quad,
    All,
}

impl ViewMode {
    pub const ALL_MODES: [ViewMode; 4] =
        [ViewMode::Single, ViewMode::Double, ViewMode::Quad, ViewMode::All];

    /// Number of pages rendered at once. `All` spans the whole document.
    pub fn window_size(self, page_count: usize) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
            Self::Quad => 4,
            Self::All => page_count,
        }
    }

    pub fn is_windowed(self) -> bool {
        matches!(self, Self::Double | Self::Quad)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
            Self::Quad => "quad",
            Self::All => "all",
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL_MODES
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown view mode: {value}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub mode: ViewMode,
    pub window_start: usize,
    pub active_page: usize,
}

impl ViewState {
    pub fn new(mode: ViewMode) -> Self {
        Self { mode, window_start: 0, active_page: 0 }
    }
}

/// Switches the arrangement. The window always restarts at the first page.
pub fn set_mode(state: &mut ViewState, mode: ViewMode) {
    state.mode = mode;
    state.window_start = 0;
}

pub fn can_shift(state: &ViewState, direction: ShiftDirection, page_count: usize) -> bool {
    if !state.mode.is_windowed() {
        return false;
    }

    let size = state.mode.window_size(page_count);
    match direction {
        ShiftDirection::Previous => state.window_start > 0,
        ShiftDirection::Next => state.window_start + size < page_count,
    }
}

/// Moves the window by one window length, clamped to the document. Returns
/// whether the state changed.
pub fn shift(state: &mut ViewState, direction: ShiftDirection, page_count: usize) -> bool {
    if !can_shift(state, direction, page_count) {
        return false;
    }

    let size = state.mode.window_size(page_count);
    state.window_start = match direction {
        ShiftDirection::Previous => state.window_start.saturating_sub(size),
        ShiftDirection::Next => (state.window_start + size).min(page_count - size),
    };

    true
}

/// Picks the page shown in `single` mode. Ignored in every other mode and
/// for indices past the end of the document.
pub fn select_page(state: &mut ViewState, page_index: usize, page_count: usize) -> bool {
    if state.mode != ViewMode::Single || page_index >= page_count {
        return false;
    }

    state.active_page = page_index;
    true
}

/// Pulls the window and active page back into range after the page count shrank.
pub fn clamp_to_page_count(state: &mut ViewState, page_count: usize) {
    let last = page_count.saturating_sub(1);
    state.active_page = state.active_page.min(last);

    if state.mode.is_windowed() {
        let size = state.mode.window_size(page_count);
        state.window_start = state.window_start.min(page_count.saturating_sub(size));
    } else {
        state.window_start = 0;
    }
}

/// Page indices currently on screen, never reaching past `page_count`.
pub fn visible_pages(state: &ViewState, page_count: usize) -> Range<usize> {
    if page_count == 0 {
        return 0..0;
    }

    match state.mode {
        ViewMode::Single => {
            let page = state.active_page.min(page_count - 1);
            page..page + 1
        }
        ViewMode::Double | ViewMode::Quad => {
            let start = state.window_start.min(page_count);
            let end = (start + state.mode.window_size(page_count)).min(page_count);
            start..end
        }
        ViewMode::All => 0..page_count,
    }
}
