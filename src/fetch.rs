// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Fetching article pages and images over HTTP.
//!
//! Medium answers plain HTTP clients with a bare redirect page for some
//! articles, so requests carry browser-like headers and one
//! `window.location.href = "…"` script redirect is followed.

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use snafu::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const TIMEOUT: Duration = Duration::from_secs(30);

static SCRIPT_REDIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"window\.location\.href\s*=\s*["']([^"']+)["']"#)
        .expect("BUG: hardcoded redirect pattern is invalid")
});

/// Errors that can occur while fetching.
#[derive(Debug, Snafu)]
pub enum FetchError {
    /// The HTTP client could not be configured.
    #[snafu(display("failed to build HTTP client: {source}"))]
    Client {
        /// The underlying error.
        source: reqwest::Error,
    },

    /// A redirect target could not be resolved to a URL.
    #[snafu(display("invalid redirect target {target:?} from {url}: {source}"))]
    Redirect {
        /// The page that redirected.
        url: String,
        /// The redirect target as written in the page.
        target: String,
        /// The parse error.
        source: url::ParseError,
    },

    /// The request failed before a complete response arrived.
    #[snafu(display("request to {url} failed: {source}"))]
    Request {
        /// The requested URL.
        url: String,
        /// The underlying error.
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[snafu(display("{url} returned HTTP {status}"))]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The downloaded file could not be written.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    Write {
        /// The destination path.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

/// Returns the target of a `window.location.href = "…"` script redirect.
#[must_use]
pub fn find_script_redirect(html: &str) -> Option<&str> {
    SCRIPT_REDIRECT
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|target| target.as_str())
}

/// A blocking HTTP client for article pages and images.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher that presents itself as a desktop browser.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(header::REFERER, HeaderValue::from_static("https://medium.com/"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(TIMEOUT)
            .build()
            .context(ClientSnafu)?;
        Ok(Self { client })
    }

    /// Fetches an article page, following one script redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails, the server answers with a
    /// non-success status, or the redirect target is not a URL.
    pub fn fetch_article(&self, url: &str) -> Result<String, FetchError> {
        let page = self.get_text(url)?;
        let Some(target) = find_script_redirect(&page) else {
            return Ok(page);
        };

        let resolved = Url::parse(url)
            .and_then(|base| base.join(target))
            .context(RedirectSnafu { url, target })?;
        if resolved.as_str() == url {
            debug!(url, "script redirect points back at the page; ignoring it");
            return Ok(page);
        }
        info!(redirect = %resolved, "following script redirect");
        self.get_text(resolved.as_str())
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        info!(url, "fetching article");
        let response = self.client.get(url).send().context(RequestSnafu { url })?;
        let status = response.status();
        ensure!(
            status.is_success(),
            StatusSnafu {
                url,
                status: status.as_u16()
            }
        );
        response.text().context(RequestSnafu { url })
    }

    /// Downloads `url` to `dest`, creating parent directories as needed.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the file cannot be written.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let mut response = self.client.get(url).send().context(RequestSnafu { url })?;
        let status = response.status();
        ensure!(
            status.is_success(),
            StatusSnafu {
                url,
                status: status.as_u16()
            }
        );

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context(WriteSnafu { path: parent })?;
        }
        let mut file = File::create(dest).context(WriteSnafu { path: dest })?;
        let bytes = response.copy_to(&mut file).context(RequestSnafu { url })?;
        debug!(url, path = %dest.display(), bytes, "downloaded image");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tempfile::TempDir;

    #[test]
    fn finds_script_redirect() {
        let html = r#"<script>window.location.href = "https://medium.com/p/abc";</script>"#;
        assert_eq!(find_script_redirect(html), Some("https://medium.com/p/abc"));
        assert_eq!(
            find_script_redirect("<script>window.location.href='/p/x'</script>"),
            Some("/p/x")
        );
        assert_eq!(find_script_redirect("<p>no redirect</p>"), None);
    }

    #[test]
    fn fetches_page() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/post")
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_body("<article><p>hi</p></article>")
            .create();

        let page = Fetcher::new()
            .unwrap()
            .fetch_article(&format!("{}/post", server.url()))
            .unwrap();

        assert_eq!(page, "<article><p>hi</p></article>");
        mock.assert();
    }

    #[test]
    fn follows_one_script_redirect() {
        let mut server = Server::new();
        server
            .mock("GET", "/short")
            .with_status(200)
            .with_body(r#"<script>window.location.href = "/full";</script>"#)
            .create();
        server
            .mock("GET", "/full")
            .with_status(200)
            .with_body("<article>real</article>")
            .create();

        let page = Fetcher::new()
            .unwrap()
            .fetch_article(&format!("{}/short", server.url()))
            .unwrap();
        assert_eq!(page, "<article>real</article>");
    }

    #[test]
    fn reports_http_errors() {
        let mut server = Server::new();
        server.mock("GET", "/gone").with_status(404).create();

        let err = Fetcher::new()
            .unwrap()
            .fetch_article(&format!("{}/gone", server.url()))
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[test]
    fn downloads_into_new_directory() {
        let mut server = Server::new();
        server
            .mock("GET", "/img.png")
            .with_status(200)
            .with_body([0x89, b'P', b'N', b'G'])
            .create();
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("images").join("img.png");

        let bytes = Fetcher::new()
            .unwrap()
            .download(&format!("{}/img.png", server.url()), &dest)
            .unwrap();

        assert_eq!(bytes, 4);
        assert_eq!(fs::read(&dest).unwrap(), [0x89, b'P', b'N', b'G']);
    }
}
