// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Anchor classification and the code-link repair.
//!
//! Medium puts inline code inside links (`<a><code>id</code></a>`) and,
//! less often, links inside inline code (`<code><a>id</a></code>`). A naive
//! conversion of the second form yields ``[`id`](url)`` turned inside out:
//! `` `[id](url)` ``, which renders as literal code. Every anchor is
//! therefore classified before rendering, and code runs are split around the
//! links they contain, so link and code-span boundaries never cross.

use crate::fragment::{Element, Node, is_block_tag};
use crate::markdown::code_span;
use url::Url;

/// Tags rendered as inline code.
const CODE_TAGS: &[&str] = &["code", "kbd", "samp", "tt"];

/// Returns `true` if `tag` renders as inline code.
#[must_use]
pub fn is_code_tag(tag: &str) -> bool {
    CODE_TAGS.contains(&tag)
}

/// How an `<a>` element is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorClass<'a> {
    /// A link whose text has no inline code.
    Plain {
        /// The raw `href`.
        href: &'a str,
    },
    /// A link whose text contains inline code. Code inside it is rendered
    /// as spans within the link text, never around the link.
    CodeWrapped {
        /// The raw `href`.
        href: &'a str,
    },
    /// Not expressible as a Markdown link; the content is rendered without
    /// one.
    Unrecognized,
}

/// Returns the anchor's `href` if it points somewhere outside the page.
#[must_use]
pub fn usable_href(anchor: &Element) -> Option<&str> {
    let href = anchor.attr("href")?.trim();
    let lowered = href.to_ascii_lowercase();
    if href.is_empty() || href.starts_with('#') || lowered.starts_with("javascript:") {
        return None;
    }
    Some(href)
}

/// Classifies an anchor element.
#[must_use]
pub fn classify(anchor: &Element) -> AnchorClass<'_> {
    let Some(href) = usable_href(anchor) else {
        return AnchorClass::Unrecognized;
    };
    if anchor.find_where(&|el| is_block_tag(&el.name)).is_some() {
        return AnchorClass::Unrecognized;
    }
    if anchor.find_where(&|el| is_code_tag(&el.name)).is_none() {
        return AnchorClass::Plain { href };
    }

    if anchor.text().trim().is_empty() && anchor.find("img").is_none() {
        return AnchorClass::Unrecognized;
    }
    AnchorClass::CodeWrapped { href }
}

/// Like [`code_span`], but keeps surrounding whitespace outside the span.
#[must_use]
pub fn padded_code_span(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return code.to_owned();
    }
    let lead = if code.starts_with(' ') { " " } else { "" };
    let trail = if code.ends_with(' ') { " " } else { "" };
    format!("{lead}{}{trail}", code_span(trimmed))
}

/// A piece of a run of adjacent inline code elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodePiece<'a> {
    /// Code outside any link.
    Code(String),
    /// A link inside the code; rendered as a link whose text is code.
    Link {
        /// The raw `href`.
        href: &'a str,
        /// The link text.
        code: String,
    },
}

/// Splits a run of adjacent code elements into code and links.
///
/// Adjacent code elements are merged into one piece, so
/// `<code>foo</code><code>bar</code>` becomes a single span instead of the
/// broken `` `foo``bar` ``.
#[must_use]
pub fn split_code_run(run: &[Node]) -> Vec<CodePiece<'_>> {
    let mut pieces = Vec::new();
    for node in run {
        push_code_node(node, &mut pieces);
    }
    pieces
}

fn push_code_node<'a>(node: &'a Node, pieces: &mut Vec<CodePiece<'a>>) {
    match node {
        Node::Text(text) => push_code_text(pieces, text),
        Node::Element(el) if el.name == "a" => match usable_href(el) {
            Some(href) => pieces.push(CodePiece::Link {
                href,
                code: el.text(),
            }),
            None => push_code_text(pieces, &el.text()),
        },
        Node::Element(el) if el.name == "br" => push_code_text(pieces, " "),
        Node::Element(el) => {
            for child in &el.children {
                push_code_node(child, pieces);
            }
        }
    }
}

fn push_code_text(pieces: &mut Vec<CodePiece<'_>>, text: &str) {
    if let Some(CodePiece::Code(last)) = pieces.last_mut() {
        last.push_str(text);
    } else {
        pieces.push(CodePiece::Code(text.to_owned()));
    }
}

/// Resolves `href` against `base`, returning `None` for unparseable input.
#[must_use]
pub fn resolve(base: Option<&Url>, href: &str) -> Option<Url> {
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(href).ok(),
        Err(_) => None,
    }
}

/// Returns `true` for `medium.com` and its subdomains.
#[must_use]
pub fn is_medium_host(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host == "medium.com" || host.ends_with(".medium.com"))
}

/// Drops Medium's `source=` tracking parameter from Medium links.
#[must_use]
pub fn strip_tracking(mut url: Url) -> Url {
    if !is_medium_host(&url) || url.query().is_none() {
        return url;
    }
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "source")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url
}
