// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Low-level Markdown syntax helpers.
//!
//! Everything here works on plain strings: escaping prose, building code
//! spans and fences that can't be broken by the code they contain, and
//! normalizing HTML whitespace.

/// Returns a markdown heading prefix with the given level and offset.
///
/// The heading level is clamped to a maximum of 6 (H6).
#[must_use]
pub fn heading(level: u8, offset: u8) -> String {
    let actual = level.saturating_add(offset).clamp(1, 6);
    "#".repeat(actual as usize)
}

/// Collapses runs of HTML whitespace into single spaces.
///
/// Leading and trailing whitespace is kept (as a single space) so that
/// adjacent inline fragments still join with a separator.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}') {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Escapes prose so it renders literally in Markdown.
///
/// Emphasis, strikethrough, code, and link punctuation get a backslash.
/// Underscores inside words are left alone since they can't open emphasis
/// there. Tag-like `<` sequences become `&lt;`/`&gt;` so they aren't taken
/// for inline HTML; a bare `<` as in `x < 5` is untouched. An `&` that
/// would start an entity reference becomes `&amp;`.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + s.len() / 8);
    let mut chars = s.char_indices().map(|(i, c)| (c, &s[i + c.len_utf8()..])).peekable();
    let mut prev: Option<char> = None;
    let mut in_tag = false;

    while let Some((c, rest)) = chars.next() {
        match c {
            '\\' | '`' | '*' | '[' | ']' | '~' => {
                result.push('\\');
                result.push(c);
            }
            '_' => {
                let intraword = prev.is_some_and(char::is_alphanumeric)
                    && chars.peek().is_some_and(|(next, _)| next.is_alphanumeric());
                if !intraword {
                    result.push('\\');
                }
                result.push(c);
            }
            '<' if chars
                .peek()
                .is_some_and(|&(next, _)| next.is_ascii_alphabetic() || next == '/' || next == '!') =>
            {
                result.push_str("&lt;");
                in_tag = true;
            }
            '>' if in_tag => {
                result.push_str("&gt;");
                in_tag = false;
            }
            '&' if starts_entity(rest) => result.push_str("&amp;"),
            _ => result.push(c),
        }
        prev = Some(c);
    }

    result
}

/// Returns `true` if `rest` (the text after an `&`) reads as an entity
/// reference body: `name;`, `#123;`, or `#x1F;`.
fn starts_entity(rest: &str) -> bool {
    let Some(end) = rest.find(';') else {
        return false;
    };
    let body = &rest[..end];
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return !hex.is_empty() && hex.len() <= 6 && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(digits) = body.strip_prefix('#') {
        return !digits.is_empty() && digits.len() <= 7 && digits.chars().all(|c| c.is_ascii_digit());
    }
    body.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && body.len() <= 32
        && body.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Length of the longest run of consecutive backticks in `s`.
fn longest_backtick_run(s: &str) -> usize {
    let mut best = 0;
    let mut current = 0;
    for c in s.chars() {
        if c == '`' {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Wraps `code` in an inline code span.
///
/// The fence is one backtick longer than the longest backtick run inside the
/// code, so the span always closes where it should. Code that starts or ends
/// with a backtick is padded with a space, which CommonMark strips again.
#[must_use]
pub fn code_span(code: &str) -> String {
    if code.is_empty() {
        return String::new();
    }
    let fence = "`".repeat(longest_backtick_run(code) + 1);
    let pad = if code.starts_with('`') || code.ends_with('`') {
        " "
    } else {
        ""
    };
    format!("{fence}{pad}{code}{pad}{fence}")
}

/// Returns a fence for a fenced code block containing `code`.
#[must_use]
pub fn code_fence(code: &str) -> String {
    "`".repeat((longest_backtick_run(code) + 1).max(3))
}

/// Formats a link destination, wrapping it in `<…>` when it contains
/// characters that would end a bare destination early.
#[must_use]
pub fn link_destination(url: &str) -> String {
    if url.contains([' ', '(', ')', '<', '>']) {
        format!("<{}>", url.replace('<', "%3C").replace('>', "%3E"))
    } else {
        url.to_owned()
    }
}

/// Escapes a paragraph opening that Markdown would read as block syntax:
/// an ATX heading, blockquote, bullet, ordered-list item, or thematic break.
#[must_use]
pub fn escape_block_start(line: &str) -> String {
    let marker_end = line.find(' ').unwrap_or(line.len());
    let marker = &line[..marker_end];
    let needs_escape = match marker {
        "-" | "+" | ">" => true,
        _ if marker.starts_with('>') => true,
        _ if !marker.is_empty() && marker.chars().all(|c| c == '#') => marker.len() <= 6,
        _ if !marker.is_empty() && marker.chars().all(|c| c == '-' || c == '=') => true,
        _ => marker
            .strip_suffix(['.', ')'])
            .is_some_and(|n| !n.is_empty() && n.len() <= 9 && n.chars().all(|c| c.is_ascii_digit())),
    };
    if !needs_escape {
        return line.to_owned();
    }
    match marker.strip_suffix(['.', ')']) {
        Some(digits) if digits.chars().all(|c| c.is_ascii_digit()) => {
            format!("{digits}\\{}", &line[digits.len()..])
        }
        _ => format!("\\{line}"),
    }
}

/// Normalizes a rendered block: collapses repeated spaces and trims each
/// line.
///
/// Hard line breaks are emitted as a trailing backslash, so trimming line
/// ends is safe.
#[must_use]
pub fn tidy_block(block: &str) -> String {
    block
        .lines()
        .map(|line| {
            let mut out = String::with_capacity(line.len());
            let mut last_space = false;
            for c in line.trim().chars() {
                if c == ' ' {
                    if !last_space {
                        out.push(c);
                    }
                    last_space = true;
                } else {
                    out.push(c);
                    last_space = false;
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn heading_applies_offset_and_clamps() {
        assert_eq!(heading(2, 0), "##");
        assert_eq!(heading(2, 1), "###");
        assert_eq!(heading(5, 4), "######");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(collapse_whitespace("a  \n\t b"), "a b");
        assert_eq!(collapse_whitespace("  lead"), " lead");
        assert_eq!(collapse_whitespace("a\u{a0}b"), "a\u{a0}b");
    }

    #[test]
    fn escapes_markdown_punctuation() {
        assert_eq!(escape_text("2 * 3"), "2 \\* 3");
        assert_eq!(escape_text("[x]"), "\\[x\\]");
        assert_eq!(escape_text("a `b`"), "a \\`b\\`");
    }

    #[test]
    fn escapes_tildes_and_entity_lookalikes() {
        assert_eq!(escape_text("~~~ not code"), "\\~\\~\\~ not code");
        assert_eq!(escape_text("~~gone~~"), "\\~\\~gone\\~\\~");
        assert_eq!(escape_text("write &copy; literally"), "write &amp;copy; literally");
        assert_eq!(escape_text("&#169; and &#xA9;"), "&amp;#169; and &amp;#xA9;");
        assert_eq!(escape_text("Q&A; R & D"), "Q&amp;A; R & D");
        assert_eq!(escape_text("fish & chips"), "fish & chips");
    }

    #[test]
    fn leaves_intraword_underscores() {
        assert_eq!(escape_text("snake_case"), "snake_case");
        assert_eq!(escape_text("_private"), "\\_private");
    }

    #[test]
    fn escapes_tag_like_text() {
        assert_eq!(escape_text("<div>"), "&lt;div&gt;");
        assert_eq!(escape_text("a < b"), "a < b");
        assert_eq!(escape_text("value<"), "value<");
    }

    #[test]
    fn code_span_uses_longer_fence() {
        assert_eq!(code_span("x"), "`x`");
        assert_eq!(code_span("a`b"), "``a`b``");
        assert_eq!(code_span("`tick`"), "`` `tick` ``");
        assert_eq!(code_span(""), "");
    }

    #[test]
    fn code_fence_is_at_least_three() {
        assert_eq!(code_fence("plain"), "```");
        assert_eq!(code_fence("```\ninner\n```"), "````");
    }

    #[test]
    fn wraps_awkward_destinations() {
        assert_eq!(link_destination("https://x.com/a"), "https://x.com/a");
        assert_eq!(
            link_destination("https://x.com/a (b)"),
            "<https://x.com/a (b)>"
        );
    }

    #[test]
    fn escapes_block_openers() {
        assert_eq!(escape_block_start("# not a heading"), "\\# not a heading");
        assert_eq!(escape_block_start("- item"), "\\- item");
        assert_eq!(escape_block_start("1. first"), "1\\. first");
        assert_eq!(escape_block_start("2024) was"), "2024\\) was");
        assert_eq!(escape_block_start("---"), "\\---");
        assert_eq!(escape_block_start("C# rocks"), "C# rocks");
        assert_eq!(escape_block_start("-5 degrees"), "-5 degrees");
        assert_eq!(escape_block_start("#hashtag"), "#hashtag");
    }

    #[test]
    fn tidies_block_lines() {
        assert_eq!(tidy_block("  a  b \n c"), "a b\nc");
    }

    proptest! {
        #[test]
        fn code_span_fence_outlasts_content(code in "[a-z` ]{1,24}") {
            let span = code_span(&code);
            let fence_len = span.chars().take_while(|&c| c == '`').count();
            prop_assert!(fence_len > longest_backtick_run(&code));
            prop_assert!(span.ends_with(&"`".repeat(fence_len)));
        }
    }
}
