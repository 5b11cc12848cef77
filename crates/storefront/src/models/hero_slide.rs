//! Home page hero carousel slides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use joy_junction_core::HeroSlideId;

/// A hero slide. Ordered by `(sort_order, created_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlide {
    pub id: HeroSlideId,
    pub src: String,
    pub alt: String,
    pub href: Option<String>,
    /// Separate artwork is shown on narrow viewports.
    pub is_for_mobile: bool,
    pub sort_order: i32,
    /// Display time in milliseconds; the carousel default applies when absent.
    pub duration: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Hero slide input for upserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHeroSlide {
    pub id: HeroSlideId,
    pub src: String,
    pub alt: String,
    pub href: Option<String>,
    pub is_for_mobile: bool,
    pub sort_order: i32,
    pub duration: Option<i32>,
}
