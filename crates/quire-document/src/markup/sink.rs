// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// html5ever tree sink — builds a temporary reference-counted DOM which is then
// converted into owned `MarkupNode`s.
//
// The HTML5 tree builder does all the error recovery (auto-closing unbalanced
// tags, moving misnested formatting elements, implicit <html>/<body>), so any
// input parses.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, QualName};
use tracing::trace;

use super::MarkupNode;

type Handle = Rc<SinkNode>;

/// Returned by `elem_name` for non-element handles; never matched by the
/// tree builder.
static NO_NAME: QualName = QualName {
    prefix: None,
    ns: html5ever::ns!(),
    local: html5ever::local_name!(""),
};

enum SinkData {
    Document,
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
    },
    Text(RefCell<StrTendril>),
    /// Comments, doctypes and processing instructions.
    Ignored,
}

struct SinkNode {
    data: SinkData,
    parent: Cell<Option<Weak<SinkNode>>>,
    children: RefCell<Vec<Handle>>,
}

impl SinkNode {
    fn new(data: SinkData) -> Handle {
        Rc::new(Self {
            data,
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    fn is_element(&self, local: &str) -> bool {
        matches!(&self.data, SinkData::Element { name, .. } if &*name.local == local)
    }
}

/// Tree sink handed to html5ever. `finish` yields the document node.
struct DomSink {
    document: Handle,
}

impl DomSink {
    fn new() -> Self {
        Self {
            document: SinkNode::new(SinkData::Document),
        }
    }
}

fn detach(node: &Handle) {
    if let Some(parent) = node.parent.take().and_then(|weak| weak.upgrade()) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
}

fn append_node(parent: &Handle, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Append text, merging with a trailing text node.
fn append_text(parent: &Handle, text: &StrTendril) {
    let merged = match parent.children.borrow().last() {
        Some(last) => match &last.data {
            SinkData::Text(existing) => {
                existing.borrow_mut().push_tendril(text);
                true
            }
            _ => false,
        },
        None => false,
    };
    if !merged {
        append_node(parent, SinkNode::new(SinkData::Text(RefCell::new(text.clone()))));
    }
}

fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(Weak::upgrade);
    node.parent.set(weak);
    parent
}

impl TreeSink for DomSink {
    type Handle = Handle;
    type Output = Handle;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        trace!(%msg, "lenient HTML parse");
    }

    fn get_document(&self) -> Self::Handle {
        self.document.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &target.data {
            SinkData::Element { name, .. } => name,
            _ => &NO_NAME,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        SinkNode::new(SinkData::Element {
            name,
            attrs: RefCell::new(attrs),
        })
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        SinkNode::new(SinkData::Ignored)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        SinkNode::new(SinkData::Ignored)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => append_node(parent, node),
            NodeOrText::AppendText(text) => append_text(parent, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if parent_of(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let Some(parent) = parent_of(sibling) else {
            return;
        };
        let Some(index) = parent
            .children
            .borrow()
            .iter()
            .position(|child| Rc::ptr_eq(child, sibling))
        else {
            return;
        };

        let node = match new_node {
            NodeOrText::AppendText(text) => {
                if index > 0 {
                    let children = parent.children.borrow();
                    if let SinkData::Text(existing) = &children[index - 1].data {
                        existing.borrow_mut().push_tendril(&text);
                        return;
                    }
                }
                SinkNode::new(SinkData::Text(RefCell::new(text)))
            }
            NodeOrText::AppendNode(node) => {
                detach(&node);
                node
            }
        };

        // Detaching may have shifted the sibling.
        let mut children = parent.children.borrow_mut();
        let index = children
            .iter()
            .position(|child| Rc::ptr_eq(child, sibling))
            .unwrap_or(children.len());
        node.parent.set(Some(Rc::downgrade(&parent)));
        children.insert(index, node);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        if let SinkData::Element {
            attrs: existing, ..
        } = &target.data
        {
            let mut existing = existing.borrow_mut();
            for attr in attrs {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children = std::mem::take(&mut *node.children.borrow_mut());
        for child in &children {
            child.parent.set(Some(Rc::downgrade(new_parent)));
        }
        new_parent.children.borrow_mut().extend(children);
    }
}

/// Parse a markup fragment and return the children of the implicit `<body>`.
///
/// Never fails: malformed input is repaired by the HTML5 tree builder the way
/// a browser would repair it.
pub fn parse(html: &str) -> Vec<MarkupNode> {
    let document = parse_document(DomSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());

    let Some(body) = find_body(&document) else {
        return Vec::new();
    };
    let children = body.children.borrow();
    children.iter().filter_map(convert).collect()
}

fn find_body(document: &Handle) -> Option<Handle> {
    let html = document
        .children
        .borrow()
        .iter()
        .find(|node| node.is_element("html"))
        .cloned()?;
    let body = html
        .children
        .borrow()
        .iter()
        .find(|node| node.is_element("body"))
        .cloned();
    body
}

fn convert(node: &Handle) -> Option<MarkupNode> {
    match &node.data {
        SinkData::Text(text) => Some(MarkupNode::Text(text.borrow().to_string())),
        SinkData::Element { name, attrs } => Some(MarkupNode::Element {
            tag: name.local.to_string(),
            attributes: attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect(),
            children: node.children.borrow().iter().filter_map(convert).collect(),
        }),
        SinkData::Document | SinkData::Ignored => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_children_are_returned() {
        let nodes = parse("<p>Hello <b>World</b></p>");
        assert_eq!(
            nodes,
            vec![MarkupNode::element(
                "p",
                &[],
                vec![
                    MarkupNode::text("Hello "),
                    MarkupNode::element("b", &[], vec![MarkupNode::text("World")]),
                ]
            )]
        );
    }

    #[test]
    fn bare_text_is_kept_at_top_level() {
        assert_eq!(parse("just text"), vec![MarkupNode::text("just text")]);
        assert!(parse("").is_empty());
    }

    #[test]
    fn attributes_are_collected() {
        let nodes = parse(r#"<img src="a.png" width="40" style="height: 10px">"#);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].attr("src"), Some("a.png"));
        assert_eq!(nodes[0].attr("width"), Some("40"));
        assert_eq!(nodes[0].attr("style"), Some("height: 10px"));
    }

    #[test]
    fn unclosed_tags_are_auto_closed() {
        let nodes = parse("<p>one<p>two");
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[1],
            MarkupNode::element("p", &[], vec![MarkupNode::text("two")])
        );
    }

    #[test]
    fn misnested_formatting_is_repaired() {
        // <b> is reopened inside the second paragraph by the adoption agency.
        let nodes = parse("<p><b>bold</p><p>still</b> plain</p>");
        assert_eq!(nodes.len(), 2);
        match &nodes[1] {
            MarkupNode::Element { tag, children, .. } => {
                assert_eq!(tag, "p");
                assert!(matches!(&children[0], MarkupNode::Element { tag, .. } if tag == "b"));
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(
            parse("a<!-- note -->b"),
            vec![MarkupNode::text("a"), MarkupNode::text("b")]
        );
    }
}
