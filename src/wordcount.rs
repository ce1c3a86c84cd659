// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Word counts before and after conversion.

use crate::frontmatter;
use std::fmt::Write;

/// Whitespace-delimited token counts of the source text and the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordCounts {
    /// Words in the article text as extracted from Medium.
    pub original: usize,
    /// Words in the converted markdown body.
    pub converted: usize,
}

impl WordCounts {
    /// Renders the comparison as a Markdown table.
    #[must_use]
    pub fn table(&self) -> String {
        let mut out = String::new();
        writeln!(out, "| Platform | Word Count |").unwrap();
        writeln!(out, "|----------|------------|").unwrap();
        writeln!(out, "| Medium   | {} |", self.original).unwrap();
        writeln!(out, "| DEV.to   | {} |", self.converted).unwrap();
        out
    }
}

/// Counts words in the original text and the converted markdown.
///
/// A frontmatter block at the start of the markdown is not counted.
#[must_use]
pub fn compare(original_text: &str, converted_markdown: &str) -> WordCounts {
    let body = frontmatter::split(converted_markdown).map_or(converted_markdown, |(_, body)| body);
    WordCounts {
        original: original_text.split_whitespace().count(),
        converted: body.split_whitespace().count(),
    }
}
