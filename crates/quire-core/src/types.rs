// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Quire export pipeline.

use serde::{Deserialize, Serialize};

/// Points per millimetre (1pt = 1/72 inch, 1 inch = 25.4mm).
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Identifier of a story in the entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub u64);

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a chapter in the entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(pub u64);

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A story: the container that gives an export its title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
}

/// A chapter as handed over by the entity store. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(default, alias = "storyId")]
    pub story_id: Option<StoryId>,
    pub title: String,
    /// Raw rich-text markup; absent content is treated as empty.
    #[serde(default)]
    pub content: String,
}

impl Chapter {
    pub fn new(id: u64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: ChapterId(id),
            story_id: None,
            title: title.into(),
            content: content.into(),
        }
    }

    /// Attach the chapter to a story.
    pub fn in_story(mut self, story_id: StoryId) -> Self {
        self.story_id = Some(story_id);
        self
    }
}

/// The kinds of world-building entity a shortcode can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Character,
    Item,
    Location,
    Lore,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Character,
        EntityKind::Item,
        EntityKind::Location,
        EntityKind::Lore,
    ];

    /// Parse the type part of a `#{type:id}` shortcode. Case-insensitive.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "character" => Some(Self::Character),
            "item" => Some(Self::Item),
            "location" => Some(Self::Location),
            "lore" => Some(Self::Lore),
            _ => None,
        }
    }

    /// Lowercase keyword as written in shortcodes.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Item => "item",
            Self::Location => "location",
            Self::Lore => "lore",
        }
    }

    /// Text substituted when the referenced entity does not exist.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Character => "Unknown Character",
            Self::Item => "Unknown Item",
            Self::Location => "Unknown Location",
            Self::Lore => "Unknown Lore",
        }
    }
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    /// Look a format up by its request key (`"docx"`, `"PDF"`, ...).
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type for the HTTP `Content-Type` header.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Which chapters to export.
///
/// `chapter_ids` wins when non-empty; otherwise every chapter of `story_id`
/// is exported. The story, when it resolves, also supplies the title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub story_id: Option<StoryId>,
    #[serde(default)]
    pub chapter_ids: Option<Vec<ChapterId>>,
}

impl ExportRequest {
    /// Export a whole story.
    pub fn story(id: u64) -> Self {
        Self {
            story_id: Some(StoryId(id)),
            chapter_ids: None,
        }
    }

    /// Export an explicit set of chapters.
    pub fn chapters(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            story_id: None,
            chapter_ids: Some(ids.into_iter().map(ChapterId).collect()),
        }
    }

    /// Use `story` for the title while exporting the explicit chapters.
    pub fn with_story(mut self, id: u64) -> Self {
        self.story_id = Some(StoryId(id));
        self
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in typographic points (width, height).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        let (w_mm, h_mm) = self.dimensions_mm();
        (w_mm as f32 * PT_PER_MM, h_mm as f32 * PT_PER_MM)
    }
}
