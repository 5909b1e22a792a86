// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Formatting accumulator — walks a markup tree carrying the inherited style
// and emits the flat event stream in document order.

use std::collections::BTreeMap;
use std::iter;

use super::style::{parse_dimension, parse_style};
use super::{MarkupNode, RenderEvent, StyleState};

/// Tags that start and end a paragraph.
pub fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div" | "section" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

/// Flatten `nodes` into render events, starting from `style`.
///
/// Pure: each subtree receives its own style value, so flags set in one
/// branch never leak into a sibling.
pub fn flatten(nodes: &[MarkupNode], style: StyleState) -> Vec<RenderEvent> {
    nodes
        .iter()
        .flat_map(|node| flatten_node(node, style))
        .collect()
}

fn flatten_node(node: &MarkupNode, style: StyleState) -> Vec<RenderEvent> {
    match node {
        MarkupNode::Text(text) if text.is_empty() => Vec::new(),
        MarkupNode::Text(text) => vec![RenderEvent::TextRun {
            text: text.clone(),
            style,
        }],
        MarkupNode::Element { tag, .. } if tag == "br" => vec![RenderEvent::LineBreak],
        MarkupNode::Element { tag, attributes, .. } if tag == "img" => {
            image_event(attributes).into_iter().collect()
        }
        MarkupNode::Element { tag, children, .. } => {
            let inner = flatten(children, style.union(StyleState::for_tag(tag)));
            if is_block_tag(tag) {
                iter::once(RenderEvent::BlockBoundary)
                    .chain(inner)
                    .chain(iter::once(RenderEvent::BlockBoundary))
                    .collect()
            } else {
                inner
            }
        }
    }
}

/// Image event for an `<img>`; `None` when it has no source.
///
/// `width` / `height` attributes win; the matching `style` declaration is the
/// fallback when an attribute is absent or blank.
fn image_event(attributes: &BTreeMap<String, String>) -> Option<RenderEvent> {
    let source = attributes.get("src").map(|s| s.trim()).filter(|s| !s.is_empty())?;
    let styles = attributes
        .get("style")
        .map(|s| parse_style(s))
        .unwrap_or_default();

    let dimension = |name: &str| {
        attributes
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| styles.get(name))
            .and_then(|v| parse_dimension(v))
    };

    Some(RenderEvent::Image {
        source: source.to_string(),
        width: dimension("width"),
        height: dimension("height"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    fn run(text: &str, style: StyleState) -> RenderEvent {
        RenderEvent::TextRun {
            text: text.into(),
            style,
        }
    }

    #[test]
    fn nested_styles_inherit_by_union() {
        let events = flatten(&parse("<p><b>a<i>b</i></b>c</p>"), StyleState::PLAIN);
        assert_eq!(
            events,
            vec![
                RenderEvent::BlockBoundary,
                run("a", StyleState::BOLD),
                run("b", StyleState::BOLD.union(StyleState::ITALIC)),
                run("c", StyleState::PLAIN),
                RenderEvent::BlockBoundary,
            ]
        );
    }

    #[test]
    fn synonyms_and_underline() {
        let events = flatten(&parse("<strong><em><u>x</u></em></strong>"), StyleState::PLAIN);
        assert_eq!(
            events,
            vec![run(
                "x",
                StyleState {
                    bold: true,
                    italic: true,
                    underline: true
                }
            )]
        );
    }

    #[test]
    fn starting_style_is_inherited() {
        let events = flatten(&[MarkupNode::text("t")], StyleState::ITALIC);
        assert_eq!(events, vec![run("t", StyleState::ITALIC)]);
    }

    #[test]
    fn whitespace_text_is_preserved_verbatim() {
        let events = flatten(&[MarkupNode::text("  \n ")], StyleState::PLAIN);
        assert_eq!(events, vec![run("  \n ", StyleState::PLAIN)]);
        assert!(flatten(&[MarkupNode::text("")], StyleState::PLAIN).is_empty());
    }

    #[test]
    fn line_breaks_and_unknown_tags() {
        let events = flatten(&parse("<span>a<br>b</span>"), StyleState::PLAIN);
        assert_eq!(
            events,
            vec![
                run("a", StyleState::PLAIN),
                RenderEvent::LineBreak,
                run("b", StyleState::PLAIN),
            ]
        );
    }

    #[test]
    fn headings_and_sections_are_blocks() {
        for tag in ["h1", "h6", "section", "div"] {
            assert!(is_block_tag(tag), "{tag}");
        }
        for tag in ["hr", "header", "span", "html"] {
            assert!(!is_block_tag(tag), "{tag}");
        }
    }

    #[test]
    fn image_dimensions_from_attributes_then_style() {
        let events = flatten(
            &parse(r#"<img src="/uploads/a.png" width="400px" style="width: 10px; height: 30px">"#),
            StyleState::PLAIN,
        );
        assert_eq!(
            events,
            vec![RenderEvent::Image {
                source: "/uploads/a.png".into(),
                width: Some(400.0),
                height: Some(30.0),
            }]
        );
    }

    #[test]
    fn image_without_source_is_skipped() {
        assert!(flatten(&parse(r#"<img width="4">"#), StyleState::PLAIN).is_empty());
        assert!(flatten(&parse(r#"<img src=" ">"#), StyleState::PLAIN).is_empty());
    }
}
