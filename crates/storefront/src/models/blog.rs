//! Blog posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use joy_junction_core::Slug;

/// A published blog post, keyed by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: Slug,
    pub title: String,
    /// Listing order (newest first).
    pub published_at: DateTime<Utc>,
    pub category: String,
    pub image: String,
    pub excerpt: String,
    /// Post body (HTML produced by the editor).
    pub content: String,
    pub author: String,
    pub author_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Blog input for upserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlog {
    pub id: Slug,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub category: String,
    pub image: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub author_image: String,
}
