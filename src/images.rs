// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Local filenames for article images.
//!
//! Images are registered in document order. Each one gets a filename derived
//! from its URL's basename; a name already taken gets `-2`, `-3`, … before
//! the extension. The same input therefore always yields the same names.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Extension used when the URL basename has none.
const DEFAULT_EXTENSION: &str = "jpg";

/// Medium CDN path segments that request a resized or re-encoded copy.
static SIZE_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:resize|format):[^/]*").expect("BUG: hardcoded size-segment pattern is invalid")
});

/// An image the caller must save for the markdown to be complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Remote URL to download from.
    pub source_url: String,
    /// Assigned filename, unique within the conversion.
    pub filename: String,
    /// Relative path used in the markdown (`<image_dir>/<filename>`).
    pub local_path: String,
}

/// Rewrites Medium CDN URLs to request the original image.
///
/// `https://miro.medium.com/v2/resize:fit:700/format:webp/1*abc.png` becomes
/// `https://miro.medium.com/v2/1*abc.png`. Other hosts are returned as is.
#[must_use]
pub fn full_size(url: &Url) -> Url {
    if url.host_str() != Some("miro.medium.com") {
        return url.clone();
    }
    let mut out = url.clone();
    let path = SIZE_SEGMENT.replace_all(url.path(), "");
    out.set_path(&path);
    out.set_query(None);
    out
}

/// Picks a URL from a `srcset` attribute, preferring the widest candidate.
#[must_use]
pub fn best_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            let width = parts
                .next()
                .and_then(|d| d.strip_suffix('w'))
                .and_then(|w| w.parse::<u32>().ok())
                .unwrap_or(0);
            Some((width, url))
        })
        .enumerate()
        // Widest wins; among equals, the earliest.
        .max_by_key(|(index, (width, _))| (*width, std::cmp::Reverse(*index)))
        .map(|(_, (_, url))| url)
}

/// Keeps characters that are safe in both filenames and link destinations.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches(|c| c == '-' || c == '.').to_owned()
}

/// Splits `name` into stem and extension, if it has a plausible one.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, Some(ext))
        }
        _ => (name, None),
    }
}

/// Derives a filename from the URL basename; `index` is the 1-based
/// position used when the basename is empty.
fn base_filename(url: &Url, index: usize) -> String {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let sanitized = sanitize(last);
    let (stem, ext) = split_extension(&sanitized);
    let stem = if stem.is_empty() {
        format!("image-{index}")
    } else {
        stem.to_owned()
    };
    format!("{stem}.{}", ext.unwrap_or(DEFAULT_EXTENSION))
}

/// Assigns filenames in document order.
#[derive(Debug)]
pub struct ImageRegistry {
    dir: String,
    references: Vec<ImageReference>,
    taken: HashSet<String>,
}

impl ImageRegistry {
    /// Creates a registry placing images under `dir` (relative to the
    /// markdown file). An empty `dir` puts them next to it.
    #[must_use]
    pub fn new(dir: &str) -> Self {
        Self {
            dir: dir.trim_end_matches('/').to_owned(),
            references: Vec::new(),
            taken: HashSet::new(),
        }
    }

    /// Registers an image and returns its reference.
    ///
    /// Every call creates a new reference, even for a URL seen before.
    pub fn register(&mut self, url: &Url) -> &ImageReference {
        let source = full_size(url);
        let candidate = base_filename(&source, self.references.len() + 1);
        let filename = self.claim(&candidate);
        let local_path = if self.dir.is_empty() {
            filename.clone()
        } else {
            format!("{}/{filename}", self.dir)
        };
        debug!(url = %source, %local_path, "registered image");

        let index = self.references.len();
        self.references.push(ImageReference {
            source_url: source.into(),
            filename,
            local_path,
        });
        &self.references[index]
    }

    /// Reserves `candidate`, or the first free `stem-N.ext` variant.
    ///
    /// Names are compared case-insensitively so the set also works on
    /// case-insensitive filesystems.
    fn claim(&mut self, candidate: &str) -> String {
        if self.taken.insert(candidate.to_lowercase()) {
            return candidate.to_owned();
        }
        let (stem, ext) = split_extension(candidate);
        let ext = ext.unwrap_or(DEFAULT_EXTENSION);
        let mut n = 2;
        loop {
            let name = format!("{stem}-{n}.{ext}");
            if self.taken.insert(name.to_lowercase()) {
                return name;
            }
            n += 1;
        }
    }

    /// The registered references, in document order.
    #[must_use]
    pub fn references(&self) -> &[ImageReference] {
        &self.references
    }

    /// Consumes the registry, returning the references in document order.
    #[must_use]
    pub fn into_references(self) -> Vec<ImageReference> {
        self.references
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn uses_url_basename() {
        let mut registry = ImageRegistry::new("images");
        let reference = registry.register(&url("https://x.com/img.png"));

        assert_eq!(reference.filename, "img.png");
        assert_eq!(reference.local_path, "images/img.png");
        assert_eq!(reference.source_url, "https://x.com/img.png");
    }

    #[test]
    fn suffixes_colliding_names() {
        let mut registry = ImageRegistry::new("images");
        registry.register(&url("https://a.com/pic.png"));
        registry.register(&url("https://b.com/pic.png"));
        registry.register(&url("https://c.com/PIC.png"));

        let names: Vec<_> = registry.references().iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["pic.png", "pic-2.png", "PIC-3.png"]);
    }

    #[test]
    fn skips_suffix_already_taken() {
        let mut registry = ImageRegistry::new("images");
        registry.register(&url("https://a.com/pic-2.png"));
        registry.register(&url("https://a.com/pic.png"));
        registry.register(&url("https://b.com/pic.png"));

        assert_eq!(registry.references()[2].filename, "pic-3.png");
    }

    #[test]
    fn defaults_extension_and_name() {
        let mut registry = ImageRegistry::new("img/");
        registry.register(&url("https://x.com/photo"));
        registry.register(&url("https://x.com/"));

        assert_eq!(registry.references()[0].local_path, "img/photo.jpg");
        assert_eq!(registry.references()[1].filename, "image-2.jpg");
    }

    #[test]
    fn normalizes_medium_cdn_urls() {
        let resized = url("https://miro.medium.com/v2/resize:fit:700/format:webp/1*AbC.png?q=20");
        assert_eq!(full_size(&resized).as_str(), "https://miro.medium.com/v2/1*AbC.png");

        let other = url("https://x.com/resize:fit:700/a.png");
        assert_eq!(full_size(&other), other);
    }

    #[test]
    fn sanitizes_medium_basenames() {
        let mut registry = ImageRegistry::new("images");
        let reference =
            registry.register(&url("https://miro.medium.com/v2/resize:fit:700/1*AbC_d.png"));
        assert_eq!(reference.filename, "1-AbC_d.png");
    }

    #[test]
    fn picks_widest_srcset_candidate() {
        let srcset = "https://x.com/a.png 640w, https://x.com/b.png 1400w, https://x.com/c.png 720w";
        assert_eq!(best_srcset_candidate(srcset), Some("https://x.com/b.png"));
        assert_eq!(best_srcset_candidate("a.png, b.png 2x"), Some("a.png"));
        assert_eq!(best_srcset_candidate(""), None);
    }

    proptest! {
        #[test]
        fn filenames_are_unique(names in proptest::collection::vec("[a-cA-C]{0,2}(\\.png)?", 1..20)) {
            let mut registry = ImageRegistry::new("images");
            for name in &names {
                registry.register(&url(&format!("https://x.com/{name}")));
            }
            let unique: HashSet<_> = registry
                .references()
                .iter()
                .map(|r| r.filename.to_lowercase())
                .collect();
            prop_assert_eq!(unique.len(), names.len());
        }
    }
}
