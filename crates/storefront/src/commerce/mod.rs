//! Read-only client for the commerce backend's store REST API.
//!
//! # Architecture
//!
//! - The commerce backend is the source of truth for products; nothing is
//!   persisted locally
//! - In-memory caching via `moka` for product responses (5 minute TTL)
//! - Only the reads needed for descriptions and search indexing are exposed
//!
//! # Example
//!
//! ```rust,ignore
//! use joy_junction_storefront::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config.commerce);
//! let product = client.get_product_by_handle("wooden-stacker").await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::CommerceClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Backend returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}
