//! Tag-based revalidation proxy to the rendering layer.
//!
//! A content tag (e.g. `hero-slides`) fans out to every rendering-layer cache
//! tag built from that content (`hero-slides`, `home`). The resolved tags are
//! posted to `{REVALIDATE_URL}/api/revalidate` as `{"tags": [...]}`.
//!
//! There is no retry and no backoff: a failed call is reported to the
//! caller, who can simply ask again.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cache::tags;
use crate::config::RevalidationConfig;

/// Header carrying the shared revalidation secret.
pub const SECRET_HEADER: &str = "x-revalidate-secret";

/// Errors that can occur when calling the rendering layer.
#[derive(Debug, Error)]
pub enum RevalidateError {
    /// The rendering layer could not be reached at all.
    #[error("revalidation service unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The rendering layer answered with a non-success status.
    #[error("revalidation rejected: {status} - {message}")]
    Upstream { status: u16, message: String },

    /// Any other HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),
}

impl From<reqwest::Error> for RevalidateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            Self::Unreachable(e)
        } else {
            Self::Http(e)
        }
    }
}

#[derive(Debug, Serialize)]
struct RevalidateBody<'a> {
    tags: &'a [String],
}

/// Expand a content tag into the rendering-layer tags it invalidates.
///
/// Unknown tags pass through unchanged.
#[must_use]
pub fn resolve_tags(tag: &str) -> Vec<String> {
    let related: &[&str] = match tag {
        tags::BLOGS => &[tags::SITEMAP],
        tags::HERO_SLIDES | tags::TESTIMONIALS => &[tags::HOME],
        tags::OFFERS => &[tags::ANNOUNCEMENT_BAR],
        tags::PRODUCTS => &[tags::SITEMAP],
        t if t.starts_with(tags::BLOG_PREFIX) => &[tags::BLOGS],
        _ => &[],
    };

    std::iter::once(tag)
        .chain(related.iter().copied())
        .map(str::to_string)
        .collect()
}

/// Client for the rendering layer's revalidation endpoint.
#[derive(Clone)]
pub struct RevalidationClient {
    client: reqwest::Client,
    endpoint: String,
    secret: Option<SecretString>,
}

impl RevalidationClient {
    /// Create a client, logging a warning when no upstream URL is configured.
    #[must_use]
    pub fn new(config: &RevalidationConfig) -> Self {
        if config.url.is_none() {
            warn!(
                url = %config.url_or_default(),
                "REVALIDATE_URL not set, using default"
            );
        }

        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/revalidate", config.url_or_default()),
            secret: config.secret.clone(),
        }
    }

    /// Whether `candidate` matches the configured secret.
    ///
    /// Always true when no secret is configured.
    #[must_use]
    pub fn accepts_secret(&self, candidate: Option<&str>) -> bool {
        match &self.secret {
            None => true,
            Some(secret) => candidate.is_some_and(|c| constant_time_eq(c, secret.expose_secret())),
        }
    }

    /// Resolve `tag` and ask the rendering layer to invalidate the result.
    ///
    /// Returns the resolved tags.
    ///
    /// # Errors
    ///
    /// Returns `RevalidateError::Unreachable` on connection failure and
    /// `RevalidateError::Upstream` when the rendering layer rejects the call.
    #[instrument(skip(self))]
    pub async fn revalidate(&self, tag: &str) -> Result<Vec<String>, RevalidateError> {
        let resolved = resolve_tags(tag);
        let response = self.build_request(&resolved).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RevalidateError::Upstream {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        info!(tags = ?resolved, "Rendering layer revalidated");
        Ok(resolved)
    }

    fn build_request(&self, tags: &[String]) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&RevalidateBody { tags });

        match &self.secret {
            Some(secret) => request.header(SECRET_HEADER, secret.expose_secret()),
            None => request,
        }
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
