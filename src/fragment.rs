// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! The cleaned article body as an owned tree of markup nodes.
//!
//! The extractor builds a [`ContentFragment`] from the parsed page, skipping
//! every node it decided to strip. The renderer only ever sees this tree, so
//! it can also be built from an HTML snippet or by hand in tests.
//!
//! # Example
//!
//! ```
//! use medium2dev::fragment::ContentFragment;
//!
//! let fragment = ContentFragment::parse("<p>Hello <b>world</b></p>");
//! assert_eq!(fragment.text(), "Hello world");
//! ```

use ego_tree::NodeId;
use scraper::{ElementRef, Html};
use std::collections::HashSet;

/// Nesting depth below which the fragment keeps only text.
const MAX_NESTING: usize = 512;

/// Tags that start a new block of prose, used to keep words apart when
/// flattening to text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "ol",
    "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Returns `true` if `tag` is a block-level element.
#[must_use]
pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// A node in the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with its attributes and children.
    Element(Element),
    /// Character data, with HTML entities already decoded.
    Text(String),
}

impl Node {
    /// Creates a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Returns the element if this node is one.
    #[must_use]
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

/// A markup element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name (e.g., `p`, `code`).
    pub name: String,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attr_with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Appends a child node.
    #[must_use]
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Appends a text child.
    #[must_use]
    pub fn text_child(self, text: impl Into<String>) -> Self {
        self.child(Node::text(text))
    }

    /// Returns the value of the named attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over the whitespace-separated class names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    /// Concatenates all descendant text, unmodified.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_raw_text(&self.children, &mut out);
        out
    }

    /// Finds the first descendant element with the given tag name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        self.find_where(&|el| el.name == name)
    }

    /// Finds the first descendant element matching `pred`, depth first.
    pub fn find_where(&self, pred: &dyn Fn(&Self) -> bool) -> Option<&Self> {
        for child in &self.children {
            if let Node::Element(el) = child {
                if pred(el) {
                    return Some(el);
                }
                if let Some(found) = el.find_where(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Collects every descendant element with the given tag name.
    #[must_use]
    pub fn find_all(&self, name: &str) -> Vec<&Self> {
        let mut found = Vec::new();
        collect_named(&self.children, name, &mut found);
        found
    }

    /// Iterates over the element children, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(Node::as_element)
    }
}

fn collect_raw_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_raw_text(&el.children, out),
        }
    }
}

fn collect_named<'a>(nodes: &'a [Node], name: &str, found: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(el) = node {
            if el.name == name {
                found.push(el);
            }
            collect_named(&el.children, name, found);
        }
    }
}

/// The cleaned article body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFragment {
    nodes: Vec<Node>,
}

impl ContentFragment {
    /// Wraps top-level nodes as a fragment.
    #[must_use]
    pub const fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Parses an HTML snippet into a fragment without any cleaning.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_fragment(html);
        Self::new(from_scraper(document.root_element(), &HashSet::new()))
    }

    /// The top-level nodes.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Plain text of the fragment with block boundaries turned into spaces.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_spaced_text(&self.nodes, &mut out);
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Text of the first paragraph that has any, whitespace-collapsed.
    #[must_use]
    pub fn first_paragraph_text(&self) -> Option<String> {
        let mut paragraphs = Vec::new();
        collect_named(&self.nodes, "p", &mut paragraphs);
        paragraphs.into_iter().find_map(|p| {
            let text = p.text().split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(text)
        })
    }

    /// Returns `true` if the fragment holds neither text nor images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !has_content(&self.nodes)
    }
}

fn collect_spaced_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let block = is_block_tag(&el.name) || el.name == "br";
                if block {
                    out.push(' ');
                }
                collect_spaced_text(&el.children, out);
                if block {
                    out.push(' ');
                }
            }
        }
    }
}

fn has_content(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Text(text) => !text.trim().is_empty(),
        Node::Element(el) => matches!(el.name.as_str(), "img" | "iframe") || has_content(&el.children),
    })
}

/// Converts the children of a parsed element, skipping nodes in `skip`.
pub(crate) fn from_scraper(element: ElementRef<'_>, skip: &HashSet<NodeId>) -> Vec<Node> {
    convert_children(element, skip, 0)
}

fn convert_children(element: ElementRef<'_>, skip: &HashSet<NodeId>, depth: usize) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in element.children() {
        if skip.contains(&child.id()) {
            continue;
        }
        match child.value() {
            scraper::Node::Text(text) => nodes.push(Node::Text(text.text.to_string())),
            scraper::Node::Element(el) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                if depth >= MAX_NESTING {
                    nodes.push(Node::Text(child_ref.text().collect()));
                    continue;
                }
                nodes.push(Node::Element(Element {
                    name: el.name().to_owned(),
                    attrs: el
                        .attrs()
                        .map(|(name, value)| (name.to_owned(), value.to_owned()))
                        .collect(),
                    children: convert_children(child_ref, skip, depth + 1),
                }));
            }
            _ => {}
        }
    }
    nodes
}
