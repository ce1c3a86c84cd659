// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Convert Medium articles to DEV.to Markdown.
//!
//! This crate turns the HTML of a published Medium article into a
//! DEV.to-compatible Markdown document with frontmatter, and tells the caller
//! which images to save where.
//!
//! # Overview
//!
//! Conversion runs in two stages:
//!
//! 1. [`extractor`] finds the article body in the page, strips Medium's UI
//!    chrome, and reads the title, subtitle, canonical URL, and date
//! 2. [`renderer`] converts the cleaned body to Markdown, repairs links
//!    around inline code, assigns local image paths, and writes the
//!    frontmatter
//!
//! [`convert`] runs both and compares word counts. Fetching the page,
//! downloading images, and publishing are left to [`fetch`] and [`devto`],
//! which the `medium2dev` binary drives.
//!
//! # Example
//!
//! ```
//! use medium2dev::{convert, frontmatter::Frontmatter, renderer::RenderOptions};
//!
//! let html = r#"<html><body><article>
//!     <h1>Test Post</h1>
//!     <p>Hello!</p>
//!     <img src="https://x.com/img.png">
//! </article></body></html>"#;
//!
//! let conversion = convert(
//!     html,
//!     Some("https://medium.com/@me/test-post-123"),
//!     &RenderOptions::default(),
//! )
//! .unwrap();
//!
//! let markdown = &conversion.result.markdown;
//! let header = Frontmatter::parse(markdown).unwrap().unwrap();
//! assert_eq!(header.title, "Test Post");
//! assert_eq!(header.canonical_url, "https://medium.com/@me/test-post-123");
//! assert!(markdown.contains("![](images/img.png)"));
//! assert_eq!(conversion.result.images.len(), 1);
//! ```
//!
//! # Modules
//!
//! - [`extractor`]: article body and metadata extraction
//! - [`signatures`]: the tables of Medium markup the extractor recognizes
//! - [`fragment`]: the cleaned article body as a tree
//! - [`renderer`]: Markdown generation with configurable output options
//! - [`links`], [`images`], [`frontmatter`], [`markdown`]: renderer helpers
//! - [`wordcount`]: before/after word counts
//! - [`fetch`], [`devto`]: HTTP collaborators used by the binary

#![deny(missing_docs)]

pub mod devto;
pub mod extractor;
pub mod fetch;
pub mod fragment;
pub mod frontmatter;
pub mod images;
pub mod links;
pub mod markdown;
pub mod renderer;
pub mod signatures;
pub mod wordcount;

use extractor::{ArticleMetadata, ExtractionError};
use renderer::{ConversionResult, RenderError, RenderOptions};
use snafu::prelude::*;
use wordcount::WordCounts;

/// Errors that can occur while converting an article.
#[derive(Debug, Snafu)]
pub enum Error {
    /// The page did not yield an article.
    #[snafu(display("failed to extract article: {source}"))]
    Extract {
        /// The extraction error.
        source: ExtractionError,
    },

    /// The article could not be rendered.
    #[snafu(display("failed to render article: {source}"))]
    Render {
        /// The rendering error.
        source: RenderError,
    },
}

/// Everything a conversion produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Metadata used for the frontmatter.
    pub metadata: ArticleMetadata,
    /// The Markdown document and the images it references.
    pub result: ConversionResult,
    /// Word counts of the extracted article and the Markdown body.
    pub word_counts: WordCounts,
}

/// Converts a Medium page to a DEV.to Markdown document.
///
/// `source_url` is the address the page was fetched from; when given it
/// becomes the canonical URL, replacing whatever the page declares.
///
/// # Errors
///
/// Returns an error if no article can be extracted from the page or the
/// result cannot be rendered.
pub fn convert(
    raw_html: &str,
    source_url: Option<&str>,
    options: &RenderOptions,
) -> Result<Conversion, Error> {
    let (fragment, metadata) = extractor::extract(raw_html).context(ExtractSnafu)?;
    let metadata = match source_url {
        Some(url) => metadata.with_source_url(url),
        None => metadata,
    };

    let result = renderer::render(&fragment, &metadata, options).context(RenderSnafu)?;
    let word_counts = wordcount::compare(&fragment.text(), &result.markdown);

    Ok(Conversion {
        metadata,
        result,
        word_counts,
    })
}
