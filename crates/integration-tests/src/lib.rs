//! Integration tests for The Joy Junction storefront.
//!
//! The tests in `tests/` talk to a running storefront over HTTP and are
//! ignored by default.
//!
//! # Running Tests
//!
//! ```bash
//! jj-cli migrate && jj-cli seed all
//! cargo run -p joy-junction-storefront &
//! cargo test -p joy-junction-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - server under test (default `http://localhost:9000`)
//! - `REVALIDATE_SECRET` - sent on internal endpoints when set

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use uuid::Uuid;

/// Base URL of the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| "http://localhost:9000".to_string())
}

/// Absolute URL for `path`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A shared HTTP client.
#[must_use]
pub fn client() -> Client {
    Client::new()
}

/// Attach the revalidation secret, when one is configured.
#[must_use]
pub fn with_secret(request: RequestBuilder) -> RequestBuilder {
    match std::env::var("REVALIDATE_SECRET") {
        Ok(secret) => request.header("x-revalidate-secret", secret),
        Err(_) => request,
    }
}

/// A client key no other test run has used, for the per-client newsletter
/// budget.
#[must_use]
pub fn fresh_client_key() -> String {
    format!("it-{}", Uuid::new_v4())
}

/// The `data` member of a success envelope.
#[must_use]
pub fn data(body: &Value) -> &Value {
    &body["data"]
}
