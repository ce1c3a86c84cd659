// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! DEV.to frontmatter.
//!
//! DEV.to reads a YAML header delimited by `---` lines. Optional fields are
//! left out entirely rather than written empty.
//!
//! # Example
//!
//! ```
//! use medium2dev::frontmatter::Frontmatter;
//!
//! let header = Frontmatter {
//!     title: "Test Post".into(),
//!     published: false,
//!     description: None,
//!     tags: Vec::new(),
//!     date: None,
//!     canonical_url: "https://medium.com/@me/test-post".into(),
//! };
//!
//! let block = header.to_block().unwrap();
//! assert!(block.starts_with("---\ntitle: Test Post\n"));
//! assert!(block.ends_with("---\n"));
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Title used when the article has none.
pub const UNTITLED: &str = "Untitled Article";

/// Longest description, in characters, before truncation.
pub const DESCRIPTION_LIMIT: usize = 150;

/// Most tags DEV.to accepts on one post.
pub const MAX_TAGS: usize = 4;

const DELIMITER: &str = "---";

/// The recognized DEV.to frontmatter fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Post title.
    pub title: String,

    /// Whether the post is live; always written, `false` for drafts.
    #[serde(default)]
    pub published: bool,

    /// Short summary shown in previews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Up to four lowercase alphanumeric tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Original publication date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Where the article was first published.
    #[serde(default)]
    pub canonical_url: String,
}

impl Frontmatter {
    /// Serializes the header including both `---` delimiters and a trailing
    /// newline.
    ///
    /// # Errors
    ///
    /// Returns an error if YAML serialization fails.
    pub fn to_block(&self) -> Result<String, serde_yaml::Error> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n"))
    }

    /// Parses the frontmatter at the start of `markdown`.
    ///
    /// Returns `None` when the document has no frontmatter block.
    #[must_use]
    pub fn parse(markdown: &str) -> Option<Result<Self, serde_yaml::Error>> {
        let (yaml, _) = split(markdown)?;
        Some(serde_yaml::from_str(yaml))
    }
}

/// Splits a document into its frontmatter YAML and the body after it.
#[must_use]
pub fn split(markdown: &str) -> Option<(&str, &str)> {
    let rest = markdown.strip_prefix("---\n")?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Normalizes tags the way DEV.to expects: lowercase ASCII alphanumerics,
/// no duplicates, at most [`MAX_TAGS`]. Tags that end up empty are dropped.
#[must_use]
pub fn sanitize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let clean: String = tag
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if !clean.is_empty() && !out.contains(&clean) {
            out.push(clean);
        }
    }
    out.truncate(MAX_TAGS);
    out
}

/// Shortens `text` to at most [`DESCRIPTION_LIMIT`] characters, cutting at
/// a word boundary and marking the cut with `...`.
#[must_use]
pub fn truncate_description(text: &str) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text;
    }
    let budget = DESCRIPTION_LIMIT - 3;
    let cut = text
        .char_indices()
        .nth(budget)
        .map_or(text.len(), |(index, _)| index);
    let head = &text[..cut];
    let head = head.rsplit_once(' ').map_or(head, |(words, _)| words);
    format!("{}...", head.trim_end_matches(|c: char| c.is_ascii_punctuation()))
}
