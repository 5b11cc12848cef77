//! Customer testimonials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use joy_junction_core::{Rating, TestimonialId};

/// A testimonial. Ordered by `(sort_order, created_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: TestimonialId,
    pub quote: String,
    pub author: String,
    pub role: Option<String>,
    pub image: Option<String>,
    pub rating: Rating,
    pub is_featured: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Testimonial input for upserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestimonial {
    pub id: TestimonialId,
    pub quote: String,
    pub author: String,
    pub role: Option<String>,
    pub image: Option<String>,
    pub rating: Rating,
    pub is_featured: bool,
    pub sort_order: i32,
}
