// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Creating DEV.to drafts through the Forem API.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt;
use std::time::Duration;
use tracing::info;

/// The public DEV.to API root.
pub const DEFAULT_BASE_URL: &str = "https://dev.to/api";

/// Environment variable the CLI reads the API key from.
pub const API_KEY_ENV: &str = "DEVTO_API_KEY";

const TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while publishing.
#[derive(Debug, Snafu)]
pub enum PublishError {
    /// No API key was supplied.
    #[snafu(display("no DEV.to API key; pass --api-key or set {API_KEY_ENV}"))]
    MissingApiKey,

    /// The HTTP client could not be configured.
    #[snafu(display("failed to build HTTP client: {source}"))]
    Client {
        /// The underlying error.
        source: reqwest::Error,
    },

    /// The request failed or the response could not be read.
    #[snafu(display("DEV.to request failed: {source}"))]
    Http {
        /// The underlying error.
        source: reqwest::Error,
    },

    /// DEV.to refused the article.
    #[snafu(display("DEV.to rejected the article (HTTP {status}): {message}"))]
    Rejected {
        /// The HTTP status code.
        status: u16,
        /// The reason DEV.to gave, or the raw response body.
        message: String,
    },
}

/// A draft created on DEV.to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Draft {
    /// Article ID.
    pub id: u64,
    /// Article URL; only the author can see it while it is a draft.
    pub url: String,
}

#[derive(Serialize)]
struct NewArticle<'a> {
    article: ArticleFields<'a>,
}

#[derive(Serialize)]
struct ArticleFields<'a> {
    title: &'a str,
    body_markdown: &'a str,
    published: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// A client for the DEV.to articles endpoint.
#[derive(Clone)]
pub struct DevToClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for DevToClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevToClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl DevToClient {
    /// Creates a client for the public DEV.to API.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_key` is blank or the HTTP client cannot be
    /// built.
    pub fn new(api_key: &str) -> Result<Self, PublishError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Creates a client for a Forem API at `base_url` (e.g.,
    /// `https://dev.to/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if `api_key` is blank or the HTTP client cannot be
    /// built.
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self, PublishError> {
        let api_key = api_key.trim();
        ensure!(!api_key.is_empty(), MissingApiKeySnafu);

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(TIMEOUT)
            .build()
            .context(ClientSnafu)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    /// Creates an unpublished article.
    ///
    /// `body_markdown` is the complete document, frontmatter included;
    /// DEV.to reads `published: false` from it as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or DEV.to rejects the article.
    pub fn create_draft(&self, title: &str, body_markdown: &str) -> Result<Draft, PublishError> {
        let endpoint = format!("{}/articles", self.base_url);
        info!(title, "creating DEV.to draft");

        let response = self
            .client
            .post(&endpoint)
            .header("api-key", &self.api_key)
            .json(&NewArticle {
                article: ArticleFields {
                    title,
                    body_markdown,
                    published: false,
                },
            })
            .send()
            .context(HttpSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map_or_else(|_| body.trim().to_owned(), |e| e.error);
            return RejectedSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let draft: Draft = response.json().context(HttpSnafu)?;
        info!(id = draft.id, url = %draft.url, "created DEV.to draft");
        Ok(draft)
    }
}
