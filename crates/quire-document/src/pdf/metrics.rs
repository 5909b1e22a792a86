// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text metrics and line breaking for the builtin Times faces.
//
// Widths come from the Times-Roman AFM for printable ASCII; bold faces are
// slightly wider. Other characters get an average width. That is accurate
// enough for greedy wrapping against a right margin.

use printpdf::BuiltinFont;

use crate::markup::StyleState;
use crate::paragraph::{Inline, Paragraph};

/// Times-Roman advance widths for U+0020..=U+007E, in 1/1000 em.
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 333, 333, 333, 500, 564, 250, 333, 250, 278, // ' '../
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, // 0..9
    278, 278, 564, 564, 564, 444, 921, // :..@
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, // A..M
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, // N..Z
    333, 278, 333, 469, 500, 333, // [..`
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, // a..m
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, // n..z
    480, 200, 480, 541, // {..~
];

const AVERAGE_WIDTH: u16 = 500;

/// Builtin face for a character style. Underline is drawn separately.
pub fn font_for(style: StyleState) -> BuiltinFont {
    match (style.bold, style.italic) {
        (false, false) => BuiltinFont::TimesRoman,
        (true, false) => BuiltinFont::TimesBold,
        (false, true) => BuiltinFont::TimesItalic,
        (true, true) => BuiltinFont::TimesBoldItalic,
    }
}

fn char_width(c: char, bold: bool) -> f32 {
    let base = match c as u32 {
        code @ 0x20..=0x7E => TIMES_ROMAN_WIDTHS[(code - 0x20) as usize],
        _ => AVERAGE_WIDTH,
    };
    let width = base as f32 / 1000.0;
    if bold { width * 1.05 } else { width }
}

/// Advance width of `text` in points.
pub fn text_width(text: &str, style: StyleState, size_pt: f32) -> f32 {
    text.chars().map(|c| char_width(c, style.bold)).sum::<f32>() * size_pt
}

/// A styled piece of a laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub style: StyleState,
}

/// One output line: fragments left to right.
pub type Line = Vec<Fragment>;

enum Token {
    /// A word; may change style mid-word (`a<b>b</b>`).
    Word(Vec<Fragment>),
    Space(StyleState),
    Break,
}

fn push_fragment(line: &mut Line, text: &str, style: StyleState) {
    match line.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => line.push(Fragment {
            text: text.to_string(),
            style,
        }),
    }
}

fn tokenize(paragraph: &Paragraph) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word: Line = Vec::new();

    for inline in paragraph.inlines() {
        match inline {
            Inline::Text { text, style } => {
                for c in text.chars() {
                    if c == ' ' {
                        if !word.is_empty() {
                            tokens.push(Token::Word(std::mem::take(&mut word)));
                        }
                        tokens.push(Token::Space(*style));
                    } else {
                        let mut buf = [0u8; 4];
                        push_fragment(&mut word, c.encode_utf8(&mut buf), *style);
                    }
                }
            }
            Inline::LineBreak => {
                if !word.is_empty() {
                    tokens.push(Token::Word(std::mem::take(&mut word)));
                }
                tokens.push(Token::Break);
            }
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    tokens
}

fn fragments_width(fragments: &[Fragment], size_pt: f32) -> f32 {
    fragments
        .iter()
        .map(|f| text_width(&f.text, f.style, size_pt))
        .sum()
}

/// Greedy line breaking of a paragraph into lines no wider than `max_width`.
///
/// Words wider than a whole line are broken between characters. A hard line
/// break always ends the line, so consecutive breaks give empty lines.
pub fn wrap(paragraph: &Paragraph, size_pt: f32, max_width: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line: Line = Vec::new();
    let mut width = 0.0;
    let mut pending_space: Option<StyleState> = None;

    for token in tokenize(paragraph) {
        match token {
            Token::Space(style) => {
                if !line.is_empty() {
                    pending_space = Some(style);
                }
            }
            Token::Break => {
                lines.push(std::mem::take(&mut line));
                width = 0.0;
                pending_space = None;
            }
            Token::Word(fragments) => {
                let word_width = fragments_width(&fragments, size_pt);
                let space_width = pending_space
                    .map(|style| text_width(" ", style, size_pt))
                    .unwrap_or(0.0);

                if !line.is_empty() && width + space_width + word_width > max_width {
                    lines.push(std::mem::take(&mut line));
                    width = 0.0;
                } else if let Some(style) = pending_space {
                    push_fragment(&mut line, " ", style);
                    width += space_width;
                }
                pending_space = None;

                if line.is_empty() && word_width > max_width {
                    width = break_long_word(&fragments, size_pt, max_width, &mut lines, &mut line);
                } else {
                    for fragment in &fragments {
                        push_fragment(&mut line, &fragment.text, fragment.style);
                    }
                    width += word_width;
                }
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Split an over-long word into full lines; the remainder stays in `line`.
/// Returns the remainder's width.
fn break_long_word(
    fragments: &[Fragment],
    size_pt: f32,
    max_width: f32,
    lines: &mut Vec<Line>,
    line: &mut Line,
) -> f32 {
    let mut width = 0.0;
    for fragment in fragments {
        for c in fragment.text.chars() {
            let mut buf = [0u8; 4];
            let s = c.encode_utf8(&mut buf);
            let w = text_width(s, fragment.style, size_pt);
            if !line.is_empty() && width + w > max_width {
                lines.push(std::mem::take(line));
                width = 0.0;
            }
            push_fragment(line, s, fragment.style);
            width += w;
        }
    }
    width
}
