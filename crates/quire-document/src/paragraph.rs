// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paragraph layout shared by both renderers.
//
// Turns the title and the per-chapter event streams into a flat list of
// `Block`s. The DOCX and PDF writers only translate blocks into their own
// output, so paragraph boundaries, whitespace handling and page structure are
// identical in both formats.

use crate::markup::{ChapterContent, RenderEvent, StyleState};

/// A piece of paragraph content.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text { text: String, style: StyleState },
    LineBreak,
}

/// Styled runs waiting to be emitted as one paragraph.
///
/// Whitespace is collapsed the way an HTML renderer displays it: any run of
/// whitespace, also across run boundaries, becomes one space, and spaces at
/// the start of a line are dropped. Adjacent runs with the same style are
/// merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    inlines: Vec<Inline>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inlines(&self) -> &[Inline] {
        &self.inlines
    }

    pub fn push_text(&mut self, text: &str, style: StyleState) {
        let mut pending_space = false;
        let mut collapsed = String::with_capacity(text.len());
        let mut at_line_start = self.at_line_start();
        let mut after_space = self.ends_with_space();

        for c in text.chars() {
            if c.is_whitespace() {
                pending_space = true;
                continue;
            }
            if pending_space && !at_line_start && !after_space {
                collapsed.push(' ');
            }
            pending_space = false;
            at_line_start = false;
            after_space = false;
            collapsed.push(c);
        }
        if pending_space && !at_line_start && !after_space {
            collapsed.push(' ');
        }

        if collapsed.is_empty() {
            return;
        }
        match self.inlines.last_mut() {
            Some(Inline::Text {
                text,
                style: last_style,
            }) if *last_style == style => text.push_str(&collapsed),
            _ => self.inlines.push(Inline::Text {
                text: collapsed,
                style,
            }),
        }
    }

    pub fn push_break(&mut self) {
        self.trim_trailing_space();
        self.inlines.push(Inline::LineBreak);
    }

    /// No visible text and no line breaks.
    pub fn is_empty(&self) -> bool {
        self.inlines.iter().all(|inline| match inline {
            Inline::Text { text, .. } => text.trim().is_empty(),
            Inline::LineBreak => false,
        })
    }

    /// Take the buffered content, leaving the buffer empty.
    pub fn take(&mut self) -> Paragraph {
        self.trim_trailing_space();
        std::mem::take(self)
    }

    /// Concatenated text, line breaks as `\n`.
    pub fn plain_text(&self) -> String {
        self.inlines
            .iter()
            .map(|inline| match inline {
                Inline::Text { text, .. } => text.as_str(),
                Inline::LineBreak => "\n",
            })
            .collect()
    }

    fn at_line_start(&self) -> bool {
        matches!(self.inlines.last(), None | Some(Inline::LineBreak))
    }

    fn ends_with_space(&self) -> bool {
        matches!(self.inlines.last(), Some(Inline::Text { text, .. }) if text.ends_with(' '))
    }

    fn trim_trailing_space(&mut self) {
        if let Some(Inline::Text { text, .. }) = self.inlines.last_mut() {
            let trimmed = text.trim_end_matches(' ').len();
            text.truncate(trimmed);
            if text.is_empty() {
                self.inlines.pop();
            }
        }
    }
}

/// One unit of rendered output.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Document title, centred and bold.
    Title(String),
    /// Chapter heading, centred and bold. Every chapter but the first starts
    /// on a new page.
    ChapterTitle {
        text: String,
        page_break_before: bool,
    },
    Paragraph(Paragraph),
    /// Centred image; resolved by the renderer.
    Image {
        source: String,
        width: Option<f32>,
        height: Option<f32>,
    },
    PageBreak,
}

/// Lay out a whole document: title, then each chapter's heading and
/// segments, with a page break between segments.
pub fn layout(title: &str, chapters: &[ChapterContent]) -> Vec<Block> {
    let mut blocks = vec![Block::Title(title.to_string())];

    for (index, chapter) in chapters.iter().enumerate() {
        blocks.push(Block::ChapterTitle {
            text: chapter.title.clone(),
            page_break_before: index > 0,
        });
        for (segment_index, segment) in chapter.segments.iter().enumerate() {
            if segment_index > 0 {
                blocks.push(Block::PageBreak);
            }
            layout_segment(segment, &mut blocks);
        }
    }

    blocks
}

/// Walk one segment's events with a fresh paragraph buffer.
fn layout_segment(events: &[RenderEvent], blocks: &mut Vec<Block>) {
    let mut current = Paragraph::new();

    for event in events {
        match event {
            RenderEvent::TextRun { text, style } => current.push_text(text, *style),
            RenderEvent::LineBreak => current.push_break(),
            RenderEvent::BlockBoundary => flush(&mut current, blocks),
            RenderEvent::Image {
                source,
                width,
                height,
            } => {
                flush(&mut current, blocks);
                blocks.push(Block::Image {
                    source: source.clone(),
                    width: *width,
                    height: *height,
                });
            }
            RenderEvent::PageBreak => {
                flush(&mut current, blocks);
                blocks.push(Block::PageBreak);
            }
        }
    }
    flush(&mut current, blocks);
}

fn flush(current: &mut Paragraph, blocks: &mut Vec<Block>) {
    let paragraph = current.take();
    if !paragraph.is_empty() {
        blocks.push(Block::Paragraph(paragraph));
    }
}
