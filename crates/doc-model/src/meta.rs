use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown document type: {0}")]
    DocumentType(String),
    #[error("unknown alignment: {0}")]
    Alignment(String),
    #[error("unknown writer tool: {0}")]
    WriterTool(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    Screenplay,
    Teleplay,
    StagePlay,
    Treatment,
    Outline,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Screenplay,
        DocumentType::Teleplay,
        DocumentType::StagePlay,
        DocumentType::Treatment,
        DocumentType::Outline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Screenplay => "screenplay",
            Self::Teleplay => "teleplay",
            Self::StagePlay => "stage_play",
            Self::Treatment => "treatment",
            Self::Outline => "outline",
        }
    }
}

impl FromStr for DocumentType {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ParseError::DocumentType(value.to_owned()))
    }
}

/// Opaque reference to a project owned by the surrounding portal. Never
/// validated here; a stale link is carried as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectLink(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub title: String,
    pub document_type: DocumentType,
    pub project_link: Option<ProjectLink>,
    pub custom_project_name: String,
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self {
            title: "Untitled Script".to_owned(),
            document_type: DocumentType::default(),
            project_link: None,
            custom_project_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for Alignment {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            _ => Err(ParseError::Alignment(value.to_owned())),
        }
    }
}

/// Toolbar toggles. Stored only; nothing here renders text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub alignment: Alignment,
}
