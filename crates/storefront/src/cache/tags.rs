//! Content tag names shared by the local cache, the revalidation proxy and
//! the rendering layer.

pub const BLOGS: &str = "blogs";
pub const HERO_SLIDES: &str = "hero-slides";
pub const TESTIMONIALS: &str = "testimonials";
pub const OFFERS: &str = "offers";
pub const PRODUCTS: &str = "products";

/// Rendering-layer-only tags (pages built from several content types).
pub const SITEMAP: &str = "sitemap";
pub const HOME: &str = "home";
pub const ANNOUNCEMENT_BAR: &str = "announcement-bar";

/// Prefix of per-post tags (`blog:<slug>`).
pub const BLOG_PREFIX: &str = "blog:";

/// Tag for a single blog post.
#[must_use]
pub fn blog(slug: &str) -> String {
    format!("{BLOG_PREFIX}{slug}")
}
