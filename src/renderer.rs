// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Markdown rendering for extracted Medium articles.
//!
//! This module turns a [`ContentFragment`] and its [`ArticleMetadata`] into
//! a DEV.to-ready Markdown document, collecting the images the document
//! refers to along the way.
//!
//! # Output Format
//!
//! The rendered document consists of:
//! - A YAML frontmatter block (see [`crate::frontmatter`])
//! - A blank line
//! - The article body, one Markdown block per paragraph, heading, list,
//!   code block, quote, image, or embed, separated by blank lines
//!
//! Images point at `<image_dir>/<filename>`; the caller downloads them from
//! the returned [`ImageReference`]s.
//!
//! # Example
//!
//! ```
//! use medium2dev::extractor::ArticleMetadata;
//! use medium2dev::fragment::ContentFragment;
//! use medium2dev::renderer::{render, RenderOptions};
//!
//! let fragment = ContentFragment::parse(
//!     r#"<p>Hello</p><img src="https://x.com/img.png">"#,
//! );
//! let metadata = ArticleMetadata {
//!     title: "Test Post".into(),
//!     subtitle: None,
//!     canonical_url: "https://medium.com/@me/test-post".into(),
//!     published: None,
//! };
//!
//! let result = render(&fragment, &metadata, &RenderOptions::default()).unwrap();
//!
//! assert!(result.markdown.starts_with("---\ntitle: Test Post\n"));
//! assert!(result.markdown.contains("![](images/img.png)"));
//! assert_eq!(result.images[0].filename, "img.png");
//! ```

use crate::extractor::ArticleMetadata;
use crate::fragment::{ContentFragment, Element, Node, is_block_tag};
use crate::frontmatter::{self, Frontmatter};
use crate::images::{ImageReference, ImageRegistry, best_srcset_candidate};
use crate::links::{self, AnchorClass, CodePiece};
use crate::markdown::{
    code_fence, collapse_whitespace, escape_block_start, escape_text, heading, link_destination,
    tidy_block,
};
use crate::signatures;
use snafu::prelude::*;
use tracing::{debug, warn};
use url::Url;

/// Directory images are placed in, relative to the markdown file.
pub const DEFAULT_IMAGE_DIR: &str = "images";

/// Largest ordered-list number CommonMark accepts (nine digits).
const MAX_LIST_NUMBER: i64 = 999_999_999;

/// Deepest element nesting the renderer will descend into.
const MAX_DEPTH: usize = 1024;

/// Written in place of an image that has no usable source.
const IMAGE_PLACEHOLDER: &str = "*(image unavailable)*";

/// Errors that can occur while rendering.
#[derive(Debug, Snafu)]
pub enum RenderError {
    /// The fragment contains an element without a tag name.
    #[snafu(display("malformed fragment: element without a tag name"))]
    MalformedFragment,

    /// The fragment nests deeper than the renderer descends.
    #[snafu(display("fragment nesting exceeds {limit} levels"))]
    TooDeep {
        /// The nesting limit.
        limit: usize,
    },

    /// The frontmatter could not be serialized.
    #[snafu(display("failed to serialize frontmatter: {source}"))]
    Frontmatter {
        /// The YAML error.
        source: serde_yaml::Error,
    },
}

/// Configuration options for Markdown rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Directory, relative to the markdown file, that image paths point
    /// into. Empty places images next to the markdown.
    pub image_dir: String,

    /// Tags for the frontmatter; sanitized and capped at four.
    pub tags: Vec<String>,

    /// Number of heading levels to shift (0-5).
    ///
    /// Article `<h1>` sections become `#` at 0, `##` at 1, and so on,
    /// clamped at `######`.
    pub heading_offset: u8,

    /// Whether to write the publication date into the frontmatter.
    pub include_date: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_dir: DEFAULT_IMAGE_DIR.to_owned(),
            tags: Vec::new(),
            heading_offset: 0,
            include_date: false,
        }
    }
}

/// A rendered document and the images it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// Frontmatter, a blank line, and the body, ending in a newline.
    pub markdown: String,
    /// Images in document order; every local path in `markdown` has one.
    pub images: Vec<ImageReference>,
}

/// Renders an article fragment as a DEV.to Markdown document.
///
/// Rendering is deterministic: the same fragment, metadata, and options
/// always produce the same document and image filenames.
///
/// # Errors
///
/// Returns an error if the fragment is malformed or too deeply nested, or
/// if the frontmatter cannot be serialized.
pub fn render(
    fragment: &ContentFragment,
    metadata: &ArticleMetadata,
    opts: &RenderOptions,
) -> Result<ConversionResult, RenderError> {
    let mut converter = Converter::new(opts, metadata);
    let body = converter.blocks(fragment.nodes(), 0)?.join("\n\n");
    let header = frontmatter_for(fragment, metadata, opts)
        .to_block()
        .context(FrontmatterSnafu)?;

    Ok(ConversionResult {
        markdown: format!("{header}\n{body}\n"),
        images: converter.images.into_references(),
    })
}

fn frontmatter_for(
    fragment: &ContentFragment,
    metadata: &ArticleMetadata,
    opts: &RenderOptions,
) -> Frontmatter {
    let title = metadata.title.trim();
    let title = if title.is_empty() {
        warn!("article has no title; using {:?}", frontmatter::UNTITLED);
        frontmatter::UNTITLED.to_owned()
    } else {
        title.to_owned()
    };

    let description = metadata
        .subtitle
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| fragment.first_paragraph_text())
        .map(|text| frontmatter::truncate_description(&text))
        .filter(|text| !text.is_empty());

    if opts.tags.len() > frontmatter::MAX_TAGS {
        warn!(
            given = opts.tags.len(),
            "DEV.to accepts at most {} tags; extra tags dropped",
            frontmatter::MAX_TAGS
        );
    }

    Frontmatter {
        title,
        published: false,
        description,
        tags: frontmatter::sanitize_tags(&opts.tags),
        date: metadata.published.filter(|_| opts.include_date),
        canonical_url: metadata.canonical_url.clone(),
    }
}

/// Walks the fragment, producing Markdown blocks and registering images.
struct Converter<'a> {
    opts: &'a RenderOptions,
    base: Option<Url>,
    images: ImageRegistry,
    in_link: bool,
    /// Caption of the enclosing figure, given to its first image.
    figure_caption: Option<String>,
}

impl<'a> Converter<'a> {
    fn new(opts: &'a RenderOptions, metadata: &ArticleMetadata) -> Self {
        Self {
            opts,
            base: Url::parse(&metadata.canonical_url).ok(),
            images: ImageRegistry::new(&opts.image_dir),
            in_link: false,
            figure_caption: None,
        }
    }

    /// Renders a sequence of sibling nodes as blocks. Runs of inline nodes
    /// between block elements become paragraphs.
    fn blocks(&mut self, nodes: &[Node], depth: usize) -> Result<Vec<String>, RenderError> {
        ensure!(depth <= MAX_DEPTH, TooDeepSnafu { limit: MAX_DEPTH });
        let mut out = Vec::new();
        let mut run_start = None;
        for (i, node) in nodes.iter().enumerate() {
            match node {
                Node::Element(el) if is_block(el) => {
                    if let Some(start) = run_start.take() {
                        self.paragraph(&nodes[start..i], depth, &mut out)?;
                    }
                    self.block(el, depth, &mut out)?;
                }
                _ => {
                    run_start.get_or_insert(i);
                }
            }
        }
        if let Some(start) = run_start {
            self.paragraph(&nodes[start..], depth, &mut out)?;
        }
        Ok(out)
    }

    fn paragraph(
        &mut self,
        nodes: &[Node],
        depth: usize,
        out: &mut Vec<String>,
    ) -> Result<(), RenderError> {
        let text = tidy_block(&self.inline(nodes, depth + 1)?);
        let text = trim_hard_breaks(&text);
        if !text.is_empty() {
            // Every line after a hard break starts a new source line.
            let lines: Vec<String> = text.split('\n').map(escape_block_start).collect();
            out.push(lines.join("\n"));
        }
        Ok(())
    }

    fn block(&mut self, el: &Element, depth: usize, out: &mut Vec<String>) -> Result<(), RenderError> {
        ensure!(!el.name.is_empty(), MalformedFragmentSnafu);
        let depth = depth + 1;
        match el.name.as_str() {
            "p" => self.paragraph(&el.children, depth, out)?,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = el.name[1..].parse().unwrap_or(1);
                let text = tidy_block(&self.inline(&el.children, depth)?.replace("\\\n", " "));
                let text = text.replace('\n', " ");
                if !text.is_empty() {
                    out.push(format!("{} {text}", heading(level, self.opts.heading_offset)));
                }
            }
            "pre" => out.extend(code_block(el)),
            "blockquote" => {
                let inner = self.blocks(&el.children, depth)?;
                if !inner.is_empty() {
                    out.push(quote(&inner.join("\n\n")));
                }
            }
            "ul" | "ol" => {
                let list = self.list(el, depth)?;
                if !list.is_empty() {
                    out.push(list);
                }
            }
            "figure" => self.figure(el, depth, out)?,
            "hr" => out.push("---".to_owned()),
            "table" => out.extend(self.table(el, depth)?),
            "iframe" => out.extend(self.embed(el)),
            _ if el.attr("role") == Some("separator") => out.push("---".to_owned()),
            _ => out.extend(self.blocks(&el.children, depth)?),
        }
        Ok(())
    }

    fn list(&mut self, el: &Element, depth: usize) -> Result<String, RenderError> {
        let ordered = el.name == "ol";
        let mut number = el.attr("start").and_then(list_start).unwrap_or(1);
        let mut marker_width = 2;
        let mut items: Vec<String> = Vec::new();

        for child in el.child_elements() {
            match child.name.as_str() {
                "li" => {
                    let body = self.blocks(&child.children, depth + 1)?.join("\n");
                    let marker = if ordered {
                        format!("{}. ", number.min(MAX_LIST_NUMBER))
                    } else {
                        "- ".to_owned()
                    };
                    marker_width = marker.len();
                    items.push(list_item(&marker, &body));
                    number = number.saturating_add(1);
                }
                // A list directly inside a list belongs to the item before it.
                "ul" | "ol" => {
                    let nested = self.list(child, depth + 1)?;
                    match items.last_mut() {
                        _ if nested.is_empty() => {}
                        Some(last) => {
                            last.push('\n');
                            last.push_str(&indent(&nested, marker_width));
                        }
                        None => items.push(nested),
                    }
                }
                other => debug!(tag = other, "skipping non-item list child"),
            }
        }
        Ok(items.join("\n"))
    }

    /// Renders a figure's content with its caption as the alt text of the
    /// first image, then the caption itself as an italic line.
    fn figure(&mut self, el: &Element, depth: usize, out: &mut Vec<String>) -> Result<(), RenderError> {
        let caption = el
            .find("figcaption")
            .map(|c| collapse_whitespace(&c.text()).trim().to_owned())
            .filter(|c| !c.is_empty());
        let content: Vec<Node> = el
            .children
            .iter()
            .filter(|n| !n.as_element().is_some_and(|c| c.name == "figcaption"))
            .cloned()
            .collect();

        let outer = std::mem::replace(&mut self.figure_caption, caption.clone());
        let blocks = self.blocks(&content, depth + 1);
        self.figure_caption = outer;
        out.extend(blocks?);

        if let Some(caption) = caption {
            out.push(format!("*{}*", escape_text(&caption)));
        }
        Ok(())
    }

    fn table(&mut self, el: &Element, depth: usize) -> Result<Option<String>, RenderError> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for tr in el.find_all("tr") {
            let mut cells = Vec::new();
            for cell in tr.child_elements().filter(|c| c.name == "td" || c.name == "th") {
                let text = self.inline(&cell.children, depth + 1)?.replace("\\\n", " ");
                cells.push(tidy_block(&text).replace('\n', " ").replace('|', "\\|"));
            }
            if !cells.is_empty() {
                rows.push(cells);
            }
        }

        let Some(width) = rows.iter().map(Vec::len).max() else {
            return Ok(None);
        };
        for row in &mut rows {
            row.resize(width, String::new());
        }

        let row_line = |cells: &[String]| format!("| {} |", cells.join(" | "));
        let mut lines = vec![
            row_line(rows[0].as_slice()),
            format!("|{}|", vec![" --- "; width].join("|")),
        ];
        lines.extend(rows[1..].iter().map(|row| row_line(row.as_slice())));
        Ok(Some(lines.join("\n")))
    }

    fn inline(&mut self, nodes: &[Node], depth: usize) -> Result<String, RenderError> {
        ensure!(depth <= MAX_DEPTH, TooDeepSnafu { limit: MAX_DEPTH });
        let mut out = String::new();
        let mut i = 0;
        while i < nodes.len() {
            let el = match &nodes[i] {
                Node::Text(text) => {
                    out.push_str(&escape_text(&collapse_whitespace(text)));
                    i += 1;
                    continue;
                }
                Node::Element(el) => el,
            };
            ensure!(!el.name.is_empty(), MalformedFragmentSnafu);

            if links::is_code_tag(&el.name) {
                let end = nodes[i..]
                    .iter()
                    .position(|n| !n.as_element().is_some_and(|e| links::is_code_tag(&e.name)))
                    .map_or(nodes.len(), |offset| i + offset);
                out.push_str(&self.code_run(&nodes[i..end]));
                i = end;
                continue;
            }

            let rendered = match el.name.as_str() {
                "strong" | "b" => self.emphasis("**", el, depth)?,
                "em" | "i" => self.emphasis("*", el, depth)?,
                "s" | "del" | "strike" => self.emphasis("~~", el, depth)?,
                "a" => self.anchor(el, depth)?,
                "img" => self.image(el, None),
                "picture" => self.picture(el),
                "br" => "\\\n".to_owned(),
                "sup" | "sub" => {
                    let inner = self.inline(&el.children, depth + 1)?;
                    if inner.trim().is_empty() {
                        inner
                    } else {
                        format!("<{0}>{1}</{0}>", el.name, inner.trim())
                    }
                }
                "iframe" => self.embed(el).unwrap_or_default(),
                "pre" => links::padded_code_span(&collapse_whitespace(&el.text())),
                "script" | "style" | "noscript" | "template" | "svg" | "button" => String::new(),
                name if is_block_tag(name) => {
                    format!(" {} ", self.inline(&el.children, depth + 1)?)
                }
                _ => self.inline(&el.children, depth + 1)?,
            };
            out.push_str(&rendered);
            i += 1;
        }
        Ok(out)
    }

    fn emphasis(&mut self, marker: &str, el: &Element, depth: usize) -> Result<String, RenderError> {
        let inner = self.inline(&el.children, depth + 1)?;
        let trimmed = inner.trim();
        // Nested identical emphasis (`<b><strong>`) is written once.
        if trimmed.is_empty() || sole_child_marker(el) == Some(marker) {
            return Ok(inner);
        }
        Ok(format!(
            "{}{marker}{trimmed}{marker}{}",
            leading_space(&inner),
            trailing_space(&inner)
        ))
    }

    fn anchor(&mut self, el: &Element, depth: usize) -> Result<String, RenderError> {
        if self.in_link {
            return self.inline(&el.children, depth + 1);
        }
        match links::classify(el) {
            AnchorClass::Plain { href } | AnchorClass::CodeWrapped { href } => {
                self.in_link = true;
                let text = self.inline(&el.children, depth + 1);
                self.in_link = false;
                let text = text?.replace("\\\n", " ");
                if text.trim().is_empty() {
                    debug!(href, "dropping link without text");
                    return Ok(text);
                }
                Ok(wrap_link(&text, &self.link_target(href)))
            }
            AnchorClass::Unrecognized => self.inline(&el.children, depth + 1),
        }
    }

    /// Renders adjacent inline code elements as one span, split around any
    /// links inside them.
    fn code_run(&self, run: &[Node]) -> String {
        let mut out = String::new();
        for piece in links::split_code_run(run) {
            match piece {
                CodePiece::Code(code) => {
                    out.push_str(&links::padded_code_span(&collapse_whitespace(&code)));
                }
                CodePiece::Link { href, code } => {
                    let span = links::padded_code_span(&collapse_whitespace(&code));
                    if self.in_link || span.trim().is_empty() {
                        out.push_str(&span);
                    } else {
                        out.push_str(&wrap_link(&span, &self.link_target(href)));
                    }
                }
            }
        }
        out
    }

    /// Resolves `href` against the article URL and drops Medium tracking.
    fn link_target(&self, href: &str) -> String {
        let resolved = links::resolve(self.base.as_ref(), href).map(links::strip_tracking);
        link_destination(resolved.as_ref().map_or(href, Url::as_str))
    }

    fn picture(&mut self, picture: &Element) -> String {
        let srcset = picture_srcset(picture);
        match picture.find("img") {
            Some(img) => self.image(img, srcset),
            None => self.image(&Element::new("img"), srcset),
        }
    }

    fn image(&mut self, img: &Element, fallback_srcset: Option<&str>) -> String {
        let alt = self
            .figure_caption
            .take()
            .or_else(|| img.attr("alt").map(ToOwned::to_owned))
            .map(|alt| escape_text(collapse_whitespace(&alt).trim()))
            .unwrap_or_default();

        let source = img
            .attr("src")
            .or_else(|| img.attr("data-src"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| img.attr("srcset").and_then(best_srcset_candidate))
            .or_else(|| fallback_srcset.and_then(best_srcset_candidate));
        let Some(source) = source else {
            warn!(alt = %alt, "image has no source; writing a placeholder");
            return IMAGE_PLACEHOLDER.to_owned();
        };

        let resolved = links::resolve(self.base.as_ref(), source)
            .filter(|url| matches!(url.scheme(), "http" | "https"));
        match resolved {
            Some(url) => {
                let path = link_destination(&self.images.register(&url).local_path);
                format!("![{alt}]({path})")
            }
            None => {
                warn!(src = source, "image source is not downloadable; keeping it as is");
                format!("![{alt}]({})", link_destination(source))
            }
        }
    }

    fn embed(&self, iframe: &Element) -> Option<String> {
        let Some(src) = iframe
            .attr("src")
            .or_else(|| iframe.attr("data-src"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            warn!("embed has no source; dropping it");
            return None;
        };

        match links::resolve(self.base.as_ref(), src) {
            Some(url) if url.host_str().is_some_and(signatures::is_embeddable_host) => {
                Some(format!("{{% embed {url} %}}"))
            }
            Some(url) => {
                warn!(%url, "embed host is not supported by DEV.to; keeping the URL");
                Some(format!("<{url}>"))
            }
            None => {
                warn!(src, "embed source is not a URL; keeping it as text");
                Some(escape_text(src))
            }
        }
    }
}

/// Returns `true` for elements rendered as their own Markdown block.
fn is_block(el: &Element) -> bool {
    is_block_tag(&el.name) || el.name == "iframe"
}

/// Parses an `<ol start>` value into the range CommonMark can number.
fn list_start(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(n) => Some(n.clamp(0, MAX_LIST_NUMBER)),
        Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => Some(MAX_LIST_NUMBER),
        Err(_) => None,
    }
}

/// Marker of the emphasis element that is `el`'s only child, ignoring
/// whitespace.
fn sole_child_marker(el: &Element) -> Option<&'static str> {
    let mut meaningful = el
        .children
        .iter()
        .filter(|n| !matches!(n, Node::Text(text) if text.trim().is_empty()));
    let only = meaningful.next()?.as_element()?;
    if meaningful.next().is_some() {
        return None;
    }
    emphasis_marker(&only.name)
}

fn emphasis_marker(tag: &str) -> Option<&'static str> {
    match tag {
        "strong" | "b" => Some("**"),
        "em" | "i" => Some("*"),
        "s" | "del" | "strike" => Some("~~"),
        _ => None,
    }
}

/// Renders a `<pre>` element as a fenced code block.
fn code_block(pre: &Element) -> Option<String> {
    let mut raw = String::new();
    collect_code(&pre.children, &mut raw);
    let raw = raw.replace('\u{a0}', " ");
    let code = raw.trim_start_matches('\n').trim_end();
    if code.trim().is_empty() {
        return None;
    }
    let fence = code_fence(code);
    let language = code_language(pre).unwrap_or_default();
    Some(format!("{fence}{language}\n{code}\n{fence}"))
}

fn collect_code(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name == "br" => out.push('\n'),
            Node::Element(el) => collect_code(&el.children, out),
        }
    }
}

/// Finds the code block language on the `<pre>` or its `<code>`.
fn code_language(pre: &Element) -> Option<String> {
    // Medium puts the language on a `<span>` directly inside the `<pre>`.
    let tagged = pre.find_where(&|el| {
        el.attr("data-code-block-lang").is_some() || el.attr("data-lang").is_some()
    });
    for el in std::iter::once(pre).chain(pre.find("code")).chain(tagged) {
        for attr in ["data-code-block-lang", "data-lang"] {
            if let Some(language) = el.attr(attr).and_then(clean_language) {
                return Some(language);
            }
        }
        for class in el.classes() {
            let language = class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .and_then(clean_language);
            if language.is_some() {
                return language;
            }
        }
    }
    None
}

fn clean_language(raw: &str) -> Option<String> {
    let language: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '-' | '_' | '.'))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (!language.is_empty()).then_some(language)
}

fn picture_srcset(picture: &Element) -> Option<&str> {
    let sources = picture.find_all("source");
    sources
        .iter()
        .copied()
        .find(|s| s.attr("type").is_none())
        .or_else(|| sources.first().copied())
        .and_then(|s| s.attr("srcset"))
}

fn quote(body: &str) -> String {
    body.lines()
        .map(|line| if line.is_empty() { ">".to_owned() } else { format!("> {line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_item(marker: &str, body: &str) -> String {
    if body.is_empty() {
        return marker.trim_end().to_owned();
    }
    let mut lines = body.lines();
    let mut out = format!("{marker}{}", lines.next().unwrap_or_default());
    for line in lines {
        out.push('\n');
        out.push_str(&indent(line, marker.len()));
    }
    out
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("{pad}{line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_link(text: &str, target: &str) -> String {
    format!(
        "{}[{}]({target}){}",
        leading_space(text),
        text.trim(),
        trailing_space(text)
    )
}

fn leading_space(s: &str) -> &'static str {
    if s.starts_with(' ') { " " } else { "" }
}

fn trailing_space(s: &str) -> &'static str {
    if s.ends_with(' ') { " " } else { "" }
}

/// Drops hard breaks at the edges of a paragraph, where they would render as
/// stray backslashes.
fn trim_hard_breaks(text: &str) -> &str {
    let mut text = text;
    while let Some(rest) = text.strip_prefix("\\\n") {
        text = rest.trim_start();
    }
    loop {
        let backslashes = text.chars().rev().take_while(|&c| c == '\\').count();
        if backslashes % 2 == 0 {
            return text;
        }
        text = text[..text.len() - 1].trim_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn metadata() -> ArticleMetadata {
        ArticleMetadata {
            title: "Test Post".into(),
            subtitle: None,
            canonical_url: "https://medium.com/@me/test-post-123".into(),
            published: NaiveDate::from_ymd_opt(2024, 3, 1),
        }
    }

    fn default_opts() -> RenderOptions {
        RenderOptions::default()
    }

    fn render_html(html: &str) -> ConversionResult {
        render(&ContentFragment::parse(html), &metadata(), &default_opts()).unwrap()
    }

    fn body(html: &str) -> String {
        let markdown = render_html(html).markdown;
        frontmatter::split(&markdown).unwrap().1.trim().to_owned()
    }

    #[test]
    fn renders_document_structure() {
        let result = render_html("<p>Hello</p>");

        assert!(result.markdown.starts_with("---\ntitle: Test Post\n"));
        assert!(result.markdown.ends_with("---\n\nHello\n"));
        assert!(result.images.is_empty());
    }

    #[test]
    fn renders_headings_with_offset() {
        assert_eq!(body("<h2>Setup</h2>"), "## Setup");

        let opts = RenderOptions {
            heading_offset: 1,
            ..default_opts()
        };
        let fragment = ContentFragment::parse("<h1>Top</h1><h6>Deep</h6>");
        let markdown = render(&fragment, &metadata(), &opts).unwrap().markdown;
        assert!(markdown.contains("\n## Top\n"));
        assert!(markdown.contains("\n###### Deep\n"));
    }

    #[test]
    fn separates_paragraphs() {
        assert_eq!(body("<p>one</p><p>two</p>"), "one\n\ntwo");
    }

    #[test]
    fn renders_inline_emphasis() {
        assert_eq!(
            body("<p>a <strong>bold</strong> and <em>soft </em>word <del>gone</del></p>"),
            "a **bold** and *soft* word ~~gone~~"
        );
    }

    #[test]
    fn does_not_double_nested_emphasis() {
        assert_eq!(body("<p><b><strong>x y</strong></b></p>"), "**x y**");
        assert_eq!(body("<p><i> <em>x</em> </i></p>"), "*x*");
    }

    #[test]
    fn keeps_bold_italic() {
        assert_eq!(body("<p><em><strong>both</strong></em></p>"), "***both***");
        assert_eq!(body("<p><strong><em>both</em></strong></p>"), "***both***");
    }

    #[test]
    fn renders_code_block_with_language() {
        let html = r#"<pre data-code-block-lang="rust"><span>fn main() {</span><br><span>    println!("hi");</span><br><span>}</span></pre>"#;
        assert_eq!(
            body(html),
            "```rust\nfn main() {\n    println!(\"hi\");\n}\n```"
        );
    }

    #[test]
    fn takes_language_from_medium_span() {
        let html = r#"<pre><span data-code-block-mode="2" data-code-block-lang="python">print(1)</span></pre>"#;
        assert_eq!(body(html), "```python\nprint(1)\n```");
    }

    #[test]
    fn takes_language_from_code_class() {
        let html = r#"<pre><code class="language-Python">print(1)</code></pre>"#;
        assert_eq!(body(html), "```python\nprint(1)\n```");
    }

    #[test]
    fn lengthens_fence_around_backticks() {
        let html = "<pre>```\nnested\n```</pre>";
        assert_eq!(body(html), "````\n```\nnested\n```\n````");
    }

    #[test]
    fn skips_empty_code_block() {
        assert_eq!(body("<pre>  \n </pre><p>after</p>"), "after");
    }

    #[test]
    fn renders_lists() {
        assert_eq!(body("<ul><li>a</li><li>b</li></ul>"), "- a\n- b");
        assert_eq!(
            body(r#"<ol start="3"><li>c</li><li>d</li></ol>"#),
            "3. c\n4. d"
        );
    }

    #[test]
    fn clamps_list_start() {
        assert_eq!(
            body(r#"<ol start="18446744073709551615"><li>a</li><li>b</li></ol>"#),
            "999999999. a\n999999999. b"
        );
        assert_eq!(
            body(r#"<ol start="9223372036854775807"><li>a</li><li>b</li></ol>"#),
            "999999999. a\n999999999. b"
        );
        assert_eq!(body(r#"<ol start="-1"><li>a</li><li>b</li></ol>"#), "0. a\n1. b");
        assert_eq!(body(r#"<ol start="0"><li>a</li></ol>"#), "0. a");
        assert_eq!(body(r#"<ol start="x"><li>a</li></ol>"#), "1. a");
    }

    #[test]
    fn indents_nested_lists() {
        assert_eq!(
            body("<ul><li>outer<ul><li>inner</li></ul></li></ul>"),
            "- outer\n  - inner"
        );
        assert_eq!(
            body("<ol start=\"9\"><li>a</li><li>b<ul><li>c</li></ul></li></ol>"),
            "9. a\n10. b\n    - c"
        );
    }

    #[test]
    fn renders_blockquote() {
        assert_eq!(
            body("<blockquote><p>one</p><p>two</p></blockquote>"),
            "> one\n>\n> two"
        );
    }

    #[test]
    fn renders_separators() {
        assert_eq!(body(r#"<p>a</p><hr><div role="separator"></div><p>b</p>"#), "a\n\n---\n\n---\n\nb");
    }

    #[test]
    fn renders_table() {
        let html = "<table><tr><th>Name</th><th>Age</th></tr><tr><td>a|b</td></tr></table>";
        assert_eq!(
            body(html),
            "| Name | Age |\n| --- | --- |\n| a\\|b |  |"
        );
    }

    #[test]
    fn renders_plain_link() {
        assert_eq!(
            body(r#"<p>see <a href="https://docs.rs/x">the docs</a>.</p>"#),
            "see [the docs](https://docs.rs/x)."
        );
    }

    #[test]
    fn resolves_relative_links_and_strips_tracking() {
        assert_eq!(
            body(r#"<p><a href="/@me/other?source=post_page">other</a></p>"#),
            "[other](https://medium.com/@me/other)"
        );
    }

    #[test]
    fn repairs_code_inside_link() {
        assert_eq!(
            body(r#"<p>Use <a href="https://docs.rs/x"><code>Vec::new</code></a> here</p>"#),
            "Use [`Vec::new`](https://docs.rs/x) here"
        );
    }

    #[test]
    fn repairs_link_inside_code() {
        assert_eq!(
            body(r#"<p><code><a href="https://docs.rs/x">x::y</a></code></p>"#),
            "[`x::y`](https://docs.rs/x)"
        );
    }

    #[test]
    fn coalesces_adjacent_code() {
        assert_eq!(body("<p><code>foo</code><code>bar</code></p>"), "`foobar`");
    }

    #[test]
    fn code_span_survives_backticks() {
        assert_eq!(body("<p><code>a`b</code></p>"), "``a`b``");
    }

    #[test]
    fn keeps_emphasis_in_code_link() {
        assert_eq!(
            body(r#"<p><a href="https://x.com"><strong>see</strong> <code>x</code></a></p>"#),
            "[**see** `x`](https://x.com)"
        );
    }

    #[test]
    fn registers_image_in_code_link() {
        let result = render_html(
            r#"<p><a href="https://x.com"><img src="https://x.com/logo.png"> <code>x</code></a></p>"#,
        );
        assert_eq!(result.images.len(), 1);
        assert!(result.markdown.contains("[![](images/logo.png) `x`](https://x.com)"));
    }

    #[test]
    fn unrecognized_anchor_keeps_text() {
        assert_eq!(body(r##"<p><a href="#x">jump</a> on</p>"##), "jump on");
    }

    #[test]
    fn registers_images_in_order() {
        let result = render_html(
            r#"<p><img src="https://x.com/a.png" alt="first"></p><img src="https://y.com/a.png">"#,
        );
        let names: Vec<_> = result.images.iter().map(|i| i.filename.as_str()).collect();

        assert_eq!(names, ["a.png", "a-2.png"]);
        assert!(result.markdown.contains("![first](images/a.png)"));
        assert!(result.markdown.contains("![](images/a-2.png)"));
    }

    #[test]
    fn uses_figure_caption() {
        let html = r#"<figure><img src="https://x.com/p.jpg" alt="ignored"><figcaption>A <b>cat</b></figcaption></figure>"#;
        assert_eq!(body(html), "![A cat](images/p.jpg)\n\n*A cat*");
    }

    #[test]
    fn renders_every_figure_image() {
        let html = r#"<figure><img src="https://x.com/a.png"><img src="https://x.com/b.png"><p>side note</p><figcaption>Pair</figcaption></figure>"#;
        let result = render_html(html);

        assert_eq!(result.images.len(), 2);
        assert_eq!(
            frontmatter::split(&result.markdown).unwrap().1.trim(),
            "![Pair](images/a.png)![](images/b.png)\n\nside note\n\n*Pair*"
        );
    }

    #[test]
    fn picks_picture_source() {
        let html = r#"<picture><source srcset="https://x.com/s.png 640w, https://x.com/l.png 1400w"><img alt="pic"></picture>"#;
        let result = render_html(html);
        assert_eq!(result.images[0].source_url, "https://x.com/l.png");
    }

    #[test]
    fn writes_placeholder_for_sourceless_image() {
        let result = render_html(r#"<p><img alt="lost"></p>"#);
        assert!(result.images.is_empty());
        assert!(result.markdown.contains(IMAGE_PLACEHOLDER));
    }

    #[test]
    fn keeps_undownloadable_image_in_place() {
        let result = render_html(r#"<img src="data:image/png;base64,AAAA">"#);
        assert!(result.images.is_empty());
        assert!(result.markdown.contains("![](data:image/png;base64,AAAA)"));
    }

    #[test]
    fn embeds_known_hosts() {
        assert_eq!(
            body(r#"<iframe src="https://gist.github.com/me/abc"></iframe>"#),
            "{% embed https://gist.github.com/me/abc %}"
        );
        assert_eq!(
            body(r#"<iframe src="https://unknown.example/widget"></iframe>"#),
            "<https://unknown.example/widget>"
        );
    }

    #[test]
    fn escapes_literal_markdown_in_text() {
        assert_eq!(body("<p># not a heading *really*</p>"), "\\# not a heading \\*really\\*");
    }

    #[test]
    fn renders_hard_breaks() {
        assert_eq!(body("<p>one<br>two<br></p>"), "one\\\ntwo");
    }

    #[test]
    fn escapes_block_openers_after_hard_breaks() {
        assert_eq!(
            body("<p>Intro line<br># Not a heading<br>- not a list</p>"),
            "Intro line\\\n\\# Not a heading\\\n\\- not a list"
        );
    }

    #[test]
    fn escapes_tilde_fence_and_entities() {
        assert_eq!(
            body("<p>~~~ not code</p><p>after</p>"),
            "\\~\\~\\~ not code\n\nafter"
        );
        assert_eq!(
            body("<p>write &amp;copy; literally</p>"),
            "write &amp;copy; literally"
        );
    }

    #[test]
    fn keeps_sup_and_sub() {
        assert_eq!(body("<p>x<sup>2</sup></p>"), "x<sup>2</sup>");
    }

    #[test]
    fn frontmatter_uses_subtitle_then_first_paragraph() {
        let result = render_html("<p>First paragraph here.</p>");
        assert!(result.markdown.contains("description: First paragraph here.\n"));

        let with_subtitle = ArticleMetadata {
            subtitle: Some("The subtitle".into()),
            ..metadata()
        };
        let fragment = ContentFragment::parse("<p>First paragraph here.</p>");
        let markdown = render(&fragment, &with_subtitle, &default_opts()).unwrap().markdown;
        assert!(markdown.contains("description: The subtitle\n"));
    }

    #[test]
    fn frontmatter_date_is_opt_in() {
        let fragment = ContentFragment::parse("<p>x</p>");
        let without = render(&fragment, &metadata(), &default_opts()).unwrap().markdown;
        assert!(!without.contains("date:"));

        let opts = RenderOptions {
            include_date: true,
            tags: vec!["Rust".into(), "web-dev".into()],
            ..default_opts()
        };
        let parsed = Frontmatter::parse(&render(&fragment, &metadata(), &opts).unwrap().markdown)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parsed.tags, ["rust", "webdev"]);
    }

    #[test]
    fn missing_title_falls_back() {
        let untitled = ArticleMetadata {
            title: "  ".into(),
            ..metadata()
        };
        let fragment = ContentFragment::parse("<p>x</p>");
        let markdown = render(&fragment, &untitled, &default_opts()).unwrap().markdown;
        let parsed = Frontmatter::parse(&markdown).unwrap().unwrap();
        assert_eq!(parsed.title, frontmatter::UNTITLED);
    }

    #[test]
    fn empty_fragment_renders_frontmatter_only() {
        let result = render_html("");
        let (_, rest) = frontmatter::split(&result.markdown).unwrap();
        assert_eq!(rest, "\n\n");
    }

    #[test]
    fn rejects_nameless_element() {
        let fragment = ContentFragment::new(vec![Node::Element(Element::new(""))]);
        assert!(matches!(
            render(&fragment, &metadata(), &default_opts()),
            Err(RenderError::MalformedFragment)
        ));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let mut el = Element::new("span").text_child("deep");
        for _ in 0..(MAX_DEPTH + 8) {
            el = Element::new("span").child(el);
        }
        let fragment = ContentFragment::new(vec![Node::Element(Element::new("p").child(el))]);
        assert!(matches!(
            render(&fragment, &metadata(), &default_opts()),
            Err(RenderError::TooDeep { .. })
        ));
    }

    #[test]
    fn rendering_is_deterministic() {
        let html = r#"<h2>T</h2><p>x <code>y</code></p><img src="https://x.com/a.png"><img src="https://x.com/a.png">"#;
        assert_eq!(render_html(html), render_html(html));
    }
}
