// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Structural signatures of Medium's page layout.
//!
//! Medium changes its markup often, so everything the extractor recognizes
//! lives here as plain tables: where the article body is, which subtrees are
//! UI chrome, which short texts are UI labels, and which phrases open a
//! publication footer. Removal is allow-list only; anything not listed stays.

use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

/// A named CSS selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Short name used in logs.
    pub name: &'static str,
    /// CSS selector matching the element.
    pub selector: &'static str,
}

const fn sig(name: &'static str, selector: &'static str) -> Signature {
    Signature { name, selector }
}

/// Article body containers, most specific first.
pub const BODY_CONTAINERS: &[Signature] = &[
    sig("article", "article"),
    sig("legacy-post-content", "div.postArticle-content"),
    sig("legacy-section", "div.section-content"),
    sig("body-field", "[data-field='body']"),
];

/// Non-content subtrees inside the body container.
pub const CHROME: &[Signature] = &[
    sig("script", "script, style, noscript, template"),
    sig("svg", "svg"),
    sig("button", "button, [role='button']"),
    sig("nav", "nav"),
    sig("aside", "aside"),
    sig("footer", "footer"),
    sig("meta-wrapper", ".speechify-ignore"),
    sig("clap", "[data-testid='headerClapButton'], .pw-multi-vote-count, .js-actionMultirecommendCount"),
    sig("recommend", ".js-actionRecommend, .buttonSet"),
    sig("listen", "[data-testid='audioPlayButton']"),
    sig("share", "[data-testid='headerSocialShareButton'], [data-testid='storyShareButton']"),
    sig("bookmark", "[data-testid='headerBookmarkButton'], [aria-label='Add to list']"),
    sig("author-name", "[data-testid='authorName'], .graf--authorName"),
    sig("author-photo", "[data-testid='authorPhoto']"),
    sig("author-lockup", ".postMetaLockup, .js-postMetaLockup, .authorLockup"),
    sig("responses", "[aria-label='responses'], [data-testid='responsesSection']"),
    sig("pull-quote", ".graf--pullquote"),
    sig("thumbnail", "img[src*='/resize:fill:']"),
];

/// Tags whose whole text is checked against [`UI_LABELS`].
///
/// Headings are excluded so a section titled "Share" survives.
pub const LABEL_TAGS: &[&str] = &["a", "button", "div", "p", "span"];

/// Ancestors under which no element is treated as a UI label, so code line
/// numbers and table figures survive.
pub const LABEL_EXEMPT_ANCESTORS: &[&str] = &["code", "ol", "pre", "table", "ul"];

/// Longest text (in chars) that can still be a UI label.
pub const LABEL_MAX_CHARS: usize = 40;

/// Full-text patterns of UI labels.
pub const UI_LABELS: &[&str] = &[
    r"(?i)^(follow|following|listen|share|sign up|sign in|get started|open in app|bookmark)$",
    r"(?i)^\d+ min read$",
    r"(?i)^\d+(\.\d+)?[km]?( claps?)?$",
    r"(?i)^member-only story$",
    r"(?i)^top highlight$",
    r"(?i)^(see all )?responses( \(\d+\))?$",
    r"^(--|·|\\--)$",
];

/// Tags that can open a publication footer.
pub const FOOTER_TAGS: &[&str] = &["blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "p"];

/// Leading phrases of publication footers; the matching element and all
/// its following siblings are dropped.
pub const FOOTERS: &[&str] = &[
    r"(?i)^in plain english\b",
    r"(?i)^thank you for being a part of\b",
    r"(?i)^more from\b",
];

/// Hosts whose iframes map to DEV.to `{% embed %}` tags.
pub const EMBED_HOSTS: &[&str] = &[
    "codepen.io",
    "codesandbox.io",
    "gist.github.com",
    "stackblitz.com",
    "www.youtube.com",
    "youtube.com",
    "youtu.be",
];

fn compile(table: &'static [Signature]) -> Vec<(&'static str, Selector)> {
    table
        .iter()
        .map(|s| match Selector::parse(s.selector) {
            Ok(selector) => (s.name, selector),
            Err(e) => panic!("BUG: signature '{}' has invalid selector: {e}", s.name),
        })
        .collect()
}

fn compile_patterns(table: &'static [&'static str]) -> Vec<Regex> {
    table
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("BUG: invalid pattern {p}: {e}")))
        .collect()
}

static BODY_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> =
    LazyLock::new(|| compile(BODY_CONTAINERS));
static CHROME_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> =
    LazyLock::new(|| compile(CHROME));
static LABEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| compile_patterns(UI_LABELS));
static FOOTER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| compile_patterns(FOOTERS));

/// Compiled [`BODY_CONTAINERS`], in priority order.
pub fn body_selectors() -> &'static [(&'static str, Selector)] {
    &BODY_SELECTORS
}

/// Compiled [`CHROME`] selectors.
pub fn chrome_selectors() -> &'static [(&'static str, Selector)] {
    &CHROME_SELECTORS
}

/// Returns `true` if `text` (trimmed, whitespace-collapsed) is a UI label.
#[must_use]
pub fn is_ui_label(text: &str) -> bool {
    text.chars().count() <= LABEL_MAX_CHARS && LABEL_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Returns `true` if `text` opens a publication footer.
#[must_use]
pub fn is_footer(text: &str) -> bool {
    FOOTER_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Returns `true` if iframes from `host` can be embedded on DEV.to.
#[must_use]
pub fn is_embeddable_host(host: &str) -> bool {
    EMBED_HOSTS.contains(&host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_tables_compile() {
        assert_eq!(body_selectors().len(), BODY_CONTAINERS.len());
        assert_eq!(chrome_selectors().len(), CHROME.len());
        assert_eq!(LABEL_PATTERNS.len(), UI_LABELS.len());
        assert_eq!(FOOTER_PATTERNS.len(), FOOTERS.len());
    }

    #[test]
    fn recognizes_ui_labels() {
        for label in ["Follow", "Listen", "Share", "5 min read", "1.2K", "42", "--", "·"] {
            assert!(is_ui_label(label), "{label} should be a label");
        }
    }

    #[test]
    fn keeps_prose() {
        for prose in ["Follow the steps below.", "Share your thoughts", "2024 was a year"] {
            assert!(!is_ui_label(prose), "{prose} should not be a label");
        }
    }

    #[test]
    fn recognizes_footers() {
        assert!(is_footer("In Plain English 🚀 Thank you"));
        assert!(is_footer("Thank you for being a part of the community"));
        assert!(!is_footer("Plain English is great"));
    }

    #[test]
    fn embeddable_hosts() {
        assert!(is_embeddable_host("gist.github.com"));
        assert!(!is_embeddable_host("medium.com"));
    }
}
