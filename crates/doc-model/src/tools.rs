use crate::meta::ParseError;
use crate::pages::PageBuffer;
use std::str::FromStr;
use viewer_core::{visible_pages, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterTool {
    SceneHeading,
    Action,
    Character,
    Parenthetical,
    Dialogue,
    Transition,
}

impl WriterTool {
    pub const ALL: [WriterTool; 6] = [
        WriterTool::SceneHeading,
        WriterTool::Action,
        WriterTool::Character,
        WriterTool::Parenthetical,
        WriterTool::Dialogue,
        WriterTool::Transition,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SceneHeading => "scene-heading",
            Self::Action => "action",
            Self::Character => "character",
            Self::Parenthetical => "parenthetical",
            Self::Dialogue => "dialogue",
            Self::Transition => "transition",
        }
    }

    pub fn macro_text(self) -> &'static str {
        match self {
            Self::SceneHeading => "\nINT. LOCATION - DAY\n",
            Self::Action => "\n",
            Self::Character => "\nCHARACTER\n",
            Self::Parenthetical => "(beat)\n",
            Self::Dialogue => "Dialogue here.\n",
            Self::Transition => "\nCUT TO:\n",
        }
    }
}

impl FromStr for WriterTool {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(value))
            .ok_or_else(|| ParseError::WriterTool(value.to_owned()))
    }
}

/// Appends `macro_text` to every page the view currently shows and returns
/// the touched indices. Either every visible page is updated or none is.
pub fn apply_tool(pages: &mut PageBuffer, view: &ViewState, macro_text: &str) -> Vec<usize> {
    let targets = visible_pages(view, pages.len());

    if !pages.append_to_range(targets.clone(), macro_text) {
        return Vec::new();
    }

    targets.collect()
}
