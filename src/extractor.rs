// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Article extraction from raw Medium HTML.
//!
//! Medium serves the article inside a page full of UI: bylines, clap and
//! share buttons, "min read" labels, follow prompts, and publication
//! footers. [`extract`] finds the article container, drops everything the
//! [`crate::signatures`] tables recognize as chrome, and returns the rest as
//! a [`ContentFragment`] together with the page's [`ArticleMetadata`].
//!
//! # Example
//!
//! ```
//! use medium2dev::extractor::extract;
//!
//! let html = r#"<html><head><title>Ignored</title></head><body><article>
//!     <h1 data-testid="storyTitle">Test Post</h1>
//!     <span>5 min read</span>
//!     <p>Hello, Medium.</p>
//! </article></body></html>"#;
//!
//! let (fragment, metadata) = extract(html).unwrap();
//! assert_eq!(metadata.title, "Test Post");
//! assert_eq!(fragment.text(), "Hello, Medium.");
//! ```

use crate::fragment::{self, ContentFragment};
use crate::signatures;
use chrono::{DateTime, NaiveDate};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use snafu::prelude::*;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Largest page accepted, in bytes.
pub const MAX_INPUT_BYTES: usize = 10 * 1024 * 1024;

macro_rules! selector {
    ($name:ident, $css:literal) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| {
            Selector::parse($css).expect(concat!("BUG: hardcoded CSS selector '", $css, "' is invalid"))
        });
    };
}

selector!(STORY_TITLE, "h1[data-testid='storyTitle']");
selector!(HEADING, "h1");
selector!(OG_TITLE, "meta[property='og:title']");
selector!(PAGE_TITLE, "title");
selector!(SUBTITLE, ".pw-subtitle-paragraph, .graf--subtitle");
selector!(CANONICAL, "link[rel='canonical']");
selector!(OG_URL, "meta[property='og:url']");
selector!(PUBLISHED, "meta[property='article:published_time']");
selector!(MEDIA, "img, iframe, picture");

/// Errors that can occur during extraction.
#[derive(Debug, Snafu)]
pub enum ExtractionError {
    /// The page exceeds [`MAX_INPUT_BYTES`].
    #[snafu(display("page is {size} bytes, over the {limit}-byte limit"))]
    TooLarge {
        /// Size of the input.
        size: usize,
        /// The limit it exceeded.
        limit: usize,
    },

    /// No known article container was found.
    #[snafu(display("no article body found; the page may not be a Medium article"))]
    BodyNotFound,

    /// The container holds no text or images once chrome is removed.
    #[snafu(display("article body is empty after removing page chrome"))]
    EmptyBody,
}

/// Facts about the article taken from the page around its body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleMetadata {
    /// Article title; empty when the page has none.
    pub title: String,
    /// Subtitle or standfirst, if the page marks one.
    pub subtitle: Option<String>,
    /// Where the article lives; empty when unknown.
    pub canonical_url: String,
    /// Publication date.
    pub published: Option<NaiveDate>,
}

impl ArticleMetadata {
    /// Uses `url` as the canonical URL.
    ///
    /// The URL the caller fetched is authoritative: it replaces whatever
    /// the page declared. A blank `url` leaves the metadata unchanged.
    #[must_use]
    pub fn with_source_url(mut self, url: &str) -> Self {
        let url = url.trim();
        if url.is_empty() {
            return self;
        }
        if !self.canonical_url.is_empty() && self.canonical_url != url {
            debug!(page = %self.canonical_url, source = url, "source URL overrides page canonical link");
        }
        url.clone_into(&mut self.canonical_url);
        self
    }
}

/// Extracts the article body and metadata from a Medium page.
///
/// # Errors
///
/// Returns an error if the page is too large, has no recognizable article
/// container, or the container is empty once chrome is removed.
pub fn extract(raw_html: &str) -> Result<(ContentFragment, ArticleMetadata), ExtractionError> {
    ensure!(
        raw_html.len() <= MAX_INPUT_BYTES,
        TooLargeSnafu {
            size: raw_html.len(),
            limit: MAX_INPUT_BYTES,
        }
    );

    let document = Html::parse_document(raw_html);
    let (signature, body) = find_body(&document).context(BodyNotFoundSnafu)?;
    debug!(signature, "found article body");

    let metadata = extract_metadata(&document);

    let mut skip = chrome_nodes(body);
    if let Some(title) = body
        .select(&HEADING)
        .find(|h| !metadata.title.is_empty() && element_text(*h) == metadata.title)
    {
        skip.insert(title.id());
    }

    let fragment = ContentFragment::new(fragment::from_scraper(body, &skip));
    ensure!(!fragment.is_empty(), EmptyBodySnafu);
    Ok((fragment, metadata))
}

fn find_body(document: &Html) -> Option<(&'static str, ElementRef<'_>)> {
    signatures::body_selectors()
        .iter()
        .find_map(|(name, selector)| document.select(selector).next().map(|el| (*name, el)))
}

/// Collects the chrome inside `body`: selector matches, UI labels, and a
/// publication footer with everything after it.
fn chrome_nodes(body: ElementRef<'_>) -> HashSet<NodeId> {
    let mut skip = HashSet::new();

    for (name, selector) in signatures::chrome_selectors() {
        for el in body.select(selector) {
            if skip.insert(el.id()) {
                debug!(signature = name, "removing chrome");
            }
        }
    }

    for el in body.descendants().skip(1).filter_map(ElementRef::wrap) {
        if !signatures::LABEL_TAGS.contains(&el.value().name()) || is_label_exempt(el) {
            continue;
        }
        let text = element_text(el);
        if !text.is_empty() && signatures::is_ui_label(&text) && el.select(&MEDIA).next().is_none() {
            debug!(label = %text, "removing UI label");
            skip.insert(el.id());
        }
    }

    let footer = body.descendants().skip(1).filter_map(ElementRef::wrap).find(|el| {
        signatures::FOOTER_TAGS.contains(&el.value().name())
            && signatures::is_footer(&element_text(*el))
    });
    if let Some(footer) = footer {
        debug!(footer = %element_text(footer), "truncating at publication footer");
        skip.insert(footer.id());
        skip.extend(footer.next_siblings().map(|sibling| sibling.id()));
    }

    skip
}

fn is_label_exempt(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| signatures::LABEL_EXEMPT_ANCESTORS.contains(&a.value().name()))
}

fn extract_metadata(document: &Html) -> ArticleMetadata {
    let title_heading = document
        .select(&STORY_TITLE)
        .next()
        .or_else(|| document.select(&HEADING).next())
        .filter(|h| !element_text(*h).is_empty());

    let title = title_heading
        .map(element_text)
        .or_else(|| meta_content(document, &OG_TITLE))
        .or_else(|| page_title(document))
        .unwrap_or_default();
    if title.is_empty() {
        warn!("page has no title");
    }

    let subtitle = title_heading
        .and_then(|h| h.next_siblings().find_map(ElementRef::wrap))
        .filter(|next| {
            next.value()
                .classes()
                .any(|class| class.to_ascii_lowercase().contains("subtitle"))
        })
        .or_else(|| document.select(&SUBTITLE).next())
        .map(element_text)
        .filter(|s| !s.is_empty());

    let canonical_url = document
        .select(&CANONICAL)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(|href| href.trim().to_owned())
        .filter(|href| !href.is_empty())
        .or_else(|| meta_content(document, &OG_URL))
        .unwrap_or_default();
    if canonical_url.is_empty() {
        debug!("page declares no canonical URL");
    }

    let published = meta_content(document, &PUBLISHED).and_then(|raw| {
        let date = parse_published(&raw);
        if date.is_none() {
            warn!(raw = %raw, "unparseable publication date");
        }
        date
    });

    ArticleMetadata {
        title,
        subtitle,
        canonical_url,
        published,
    }
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(ToOwned::to_owned)
}

/// The `<title>`, minus Medium's `| by Author | Medium` suffix.
fn page_title(document: &Html) -> Option<String> {
    let text = element_text(document.select(&PAGE_TITLE).next()?);
    let title = text.split(" | ").next().unwrap_or_default().trim();
    (!title.is_empty()).then(|| title.to_owned())
}

/// Parses an RFC 3339 timestamp, or at least its leading `YYYY-MM-DD`.
fn parse_published(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok())
}

/// Whitespace-collapsed text of an element.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
