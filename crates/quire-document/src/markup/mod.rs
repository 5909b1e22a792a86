// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markup module — chapter markup to a flat, styled event stream.
//
// A chapter's resolved markup is split into page segments on the literal
// `#{pagebreak}` marker, each segment is parsed into a node tree, and the tree
// is flattened into `RenderEvent`s that both renderers consume.

pub mod flatten;
pub mod sink;
pub mod style;

use std::collections::BTreeMap;

pub use flatten::flatten;
pub use sink::parse;

/// Manual page-break marker. A plain-text convention, not a tag.
pub const PAGE_BREAK_MARKER: &str = "#{pagebreak}";

/// A parsed markup node. Immutable once built; children are owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    Element {
        /// Lowercase local tag name.
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<MarkupNode>,
    },
}

impl MarkupNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn element(tag: &str, attributes: &[(&str, &str)], children: Vec<MarkupNode>) -> Self {
        Self::Element {
            tag: tag.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }

    /// Attribute value, for elements.
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Self::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            Self::Text(_) => None,
        }
    }
}

/// Inherited character formatting.
///
/// Passed by value down the tree and combined by union: once an ancestor
/// turns a flag on, every descendant has it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StyleState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl StyleState {
    pub const PLAIN: StyleState = StyleState {
        bold: false,
        italic: false,
        underline: false,
    };

    pub const BOLD: StyleState = StyleState {
        bold: true,
        italic: false,
        underline: false,
    };

    pub const ITALIC: StyleState = StyleState {
        bold: false,
        italic: true,
        underline: false,
    };

    pub const UNDERLINE: StyleState = StyleState {
        bold: false,
        italic: false,
        underline: true,
    };

    /// Flags contributed by a tag on its own.
    pub fn for_tag(tag: &str) -> Self {
        Self {
            bold: matches!(tag, "b" | "strong"),
            italic: matches!(tag, "i" | "em"),
            underline: tag == "u",
        }
    }

    pub fn union(self, other: StyleState) -> Self {
        Self {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
        }
    }
}

/// One step of the flattened document.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// Text to append to the current paragraph.
    TextRun { text: String, style: StyleState },
    /// Hard line break inside the current paragraph.
    LineBreak,
    /// Standalone image block. Dimensions are in points when given.
    Image {
        source: String,
        width: Option<f32>,
        height: Option<f32>,
    },
    /// End the current paragraph.
    BlockBoundary,
    /// End the current paragraph and start a new page.
    PageBreak,
}

/// A chapter ready for rendering: its title and one event list per page
/// segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterContent {
    pub title: String,
    pub segments: Vec<Vec<RenderEvent>>,
}

impl ChapterContent {
    /// Split, parse and flatten already shortcode-resolved markup.
    pub fn from_markup(title: impl Into<String>, markup: &str) -> Self {
        let segments = split_segments(markup)
            .into_iter()
            .map(|segment| flatten(&parse(segment), StyleState::PLAIN))
            .collect();
        Self {
            title: title.into(),
            segments,
        }
    }
}

/// Split markup on every page-break marker. `n` markers give `n + 1`
/// segments, empty ones included.
pub fn split_segments(markup: &str) -> Vec<&str> {
    markup.split(PAGE_BREAK_MARKER).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_marker_gives_two_segments() {
        let segments = split_segments("<p>one</p>#{pagebreak}<p>two</p>");
        assert_eq!(segments, vec!["<p>one</p>", "<p>two</p>"]);
    }

    #[test]
    fn trailing_and_repeated_markers_keep_empty_segments() {
        assert_eq!(split_segments("a#{pagebreak}"), vec!["a", ""]);
        assert_eq!(split_segments("#{pagebreak}#{pagebreak}"), vec!["", "", ""]);
        assert_eq!(split_segments(""), vec![""]);
    }

    #[test]
    fn style_union_never_resets() {
        let style = StyleState::BOLD.union(StyleState::for_tag("em"));
        assert!(style.bold && style.italic && !style.underline);
        assert_eq!(style.union(StyleState::PLAIN), style);
    }

    #[test]
    fn chapter_content_flushes_segments_independently() {
        let chapter = ChapterContent::from_markup("One", "<p>a</p>#{pagebreak}<p><b>b</b></p>");
        assert_eq!(chapter.segments.len(), 2);
        assert_eq!(
            chapter.segments[1],
            vec![
                RenderEvent::BlockBoundary,
                RenderEvent::TextRun {
                    text: "b".into(),
                    style: StyleState::BOLD
                },
                RenderEvent::BlockBoundary,
            ]
        );
    }
}
