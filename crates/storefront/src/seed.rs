//! Built-in content fixtures and the seeding routine shared by the dev-only
//! `/api/seed/*` endpoints and `jj-cli seed`.
//!
//! Seeding upserts by id, so running it twice leaves the same rows behind.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use joy_junction_core::{HeroSlideId, OfferId, Rating, Slug, TestimonialId};

use crate::cache::tags;
use crate::db::{
    BlogRepository, HeroSlideRepository, OfferRepository, RepositoryError, TestimonialRepository,
};
use crate::error::AppError;
use crate::models::{NewBlog, NewHeroSlide, NewOffer, NewTestimonial};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A built-in fixture failed validation.
    #[error("invalid fixture: {0}")]
    InvalidFixture(String),
}

impl From<SeedError> for AppError {
    fn from(e: SeedError) -> Self {
        match e {
            SeedError::Repository(e) => Self::Database(e),
            SeedError::InvalidFixture(msg) => Self::Internal(msg),
        }
    }
}

/// What to seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedTarget {
    Blogs,
    HeroSlides,
    Testimonials,
    Offers,
    All,
}

impl SeedTarget {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blogs => "blogs",
            Self::HeroSlides => "hero-slides",
            Self::Testimonials => "testimonials",
            Self::Offers => "offers",
            Self::All => "all",
        }
    }

    /// Content tags whose cached reads are stale after seeding this target.
    #[must_use]
    pub fn cache_tags(self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::Blogs => &[tags::BLOGS],
            Self::HeroSlides => &[tags::HERO_SLIDES],
            Self::Testimonials => &[tags::TESTIMONIALS],
            Self::Offers => &[tags::OFFERS],
            Self::All => &[tags::BLOGS, tags::HERO_SLIDES, tags::TESTIMONIALS, tags::OFFERS],
        };
        names.iter().map(|s| (*s).to_string()).collect()
    }
}

impl fmt::Display for SeedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown seed target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown seed target: {0}")]
pub struct UnknownTarget(pub String);

impl FromStr for SeedTarget {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blogs" => Ok(Self::Blogs),
            "hero-slides" => Ok(Self::HeroSlides),
            "testimonials" => Ok(Self::Testimonials),
            "offers" => Ok(Self::Offers),
            "all" => Ok(Self::All),
            other => Err(UnknownTarget(other.to_string())),
        }
    }
}

/// Rows written per content type.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport(BTreeMap<&'static str, usize>);

impl SeedReport {
    #[must_use]
    pub fn get(&self, target: SeedTarget) -> Option<usize> {
        self.0.get(target.as_str()).copied()
    }

    /// Iterate `(content type, rows)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Upsert the fixtures for `target`.
///
/// # Errors
///
/// Returns `SeedError` if a fixture is invalid or a write fails.
pub async fn seed(pool: &PgPool, target: SeedTarget) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    if matches!(target, SeedTarget::Blogs | SeedTarget::All) {
        let count = BlogRepository::new(pool).upsert_all(&blogs()?).await?;
        report.0.insert(SeedTarget::Blogs.as_str(), count);
    }
    if matches!(target, SeedTarget::HeroSlides | SeedTarget::All) {
        let count = HeroSlideRepository::new(pool).upsert_all(&hero_slides()).await?;
        report.0.insert(SeedTarget::HeroSlides.as_str(), count);
    }
    if matches!(target, SeedTarget::Testimonials | SeedTarget::All) {
        let count = TestimonialRepository::new(pool)
            .upsert_all(&testimonials()?)
            .await?;
        report.0.insert(SeedTarget::Testimonials.as_str(), count);
    }
    if matches!(target, SeedTarget::Offers | SeedTarget::All) {
        let count = OfferRepository::new(pool).upsert_all(&offers()).await?;
        report.0.insert(SeedTarget::Offers.as_str(), count);
    }

    info!(seed_target = %target, report = ?report, "Seeding complete");
    Ok(report)
}

// =============================================================================
// Fixtures
// =============================================================================

fn timestamp(rfc3339: &str) -> Result<DateTime<Utc>, SeedError> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SeedError::InvalidFixture(format!("{rfc3339}: {e}")))
}

/// Blog post fixtures. Ids are derived from the titles.
///
/// # Errors
///
/// Returns `SeedError::InvalidFixture` if a publish date fails to parse.
pub fn blogs() -> Result<Vec<NewBlog>, SeedError> {
    let posts = [
        (
            "Choosing Toys That Grow With Your Child",
            "2025-11-03T09:00:00Z",
            "Parenting",
            "/images/blog/toys-that-grow.jpg",
            "Open-ended toys stay interesting for years. Here's how to spot them.",
            "<p>The best toys are ninety percent child and ten percent toy. Blocks, \
             stackers and loose parts invite a toddler to bang and sort, and the same \
             set invites a five-year-old to build castles.</p>\
             <h2>What to look for</h2>\
             <ul><li>No single right way to play</li><li>Sturdy natural materials</li>\
             <li>Pieces that combine with toys you already own</li></ul>",
            "Meera Iyer",
            "/images/authors/meera.jpg",
        ),
        (
            "Five Rainy Day Games Using One Wooden Stacker",
            "2025-12-12T10:30:00Z",
            "Play Ideas",
            "/images/blog/rainy-day-stacker.jpg",
            "Colour hunts, ring toss and more, all with the rainbow stacker.",
            "<p>Stuck indoors? Pull out the rainbow stacker.</p>\
             <ol><li>Colour hunt around the house</li><li>Ring toss onto the peg</li>\
             <li>Biggest to smallest race</li><li>Sound shaker in a box</li>\
             <li>Story stones for pretend play</li></ol>",
            "Arjun Rao",
            "/images/authors/arjun.jpg",
        ),
        (
            "Why We Test Every Toy for Safety Twice",
            "2026-01-20T08:00:00Z",
            "Behind the Scenes",
            "/images/blog/safety-testing.jpg",
            "From paint to packaging, a look inside our safety checks.",
            "<p>Every toy on our shelves passes the manufacturer's certification and \
             then our own checks for small parts, sharp edges and non-toxic finishes.</p>",
            "Meera Iyer",
            "/images/authors/meera.jpg",
        ),
    ];

    posts
        .into_iter()
        .map(
            |(title, published, category, image, excerpt, content, author, author_image)| {
                Ok(NewBlog {
                    id: Slug::slugify(title),
                    title: title.to_string(),
                    published_at: timestamp(published)?,
                    category: category.to_string(),
                    image: image.to_string(),
                    excerpt: excerpt.to_string(),
                    content: content.to_string(),
                    author: author.to_string(),
                    author_image: author_image.to_string(),
                })
            },
        )
        .collect()
}

/// Hero slide fixtures: a desktop and a mobile variant of each banner.
#[must_use]
pub fn hero_slides() -> Vec<NewHeroSlide> {
    let banners = [
        ("new-arrivals", "New arrivals for little explorers", Some("/collections/new-arrivals"), Some(6000)),
        ("wooden-classics", "Wooden classics, made to last", Some("/collections/wooden-toys"), None),
        ("gift-guide", "The Joy Junction gift guide", None, Some(8000)),
    ];

    banners
        .into_iter()
        .enumerate()
        .flat_map(|(i, (name, alt, href, duration))| {
            let order = i32::try_from(i).unwrap_or(i32::MAX);
            [false, true].into_iter().map(move |mobile| {
                let suffix = if mobile { "mobile" } else { "desktop" };
                NewHeroSlide {
                    id: HeroSlideId::new(order * 2 + i32::from(mobile) + 1),
                    src: format!("/images/hero/{name}-{suffix}.jpg"),
                    alt: alt.to_string(),
                    href: href.map(str::to_string),
                    is_for_mobile: mobile,
                    sort_order: order,
                    duration,
                }
            })
        })
        .collect()
}

/// Testimonial fixtures.
///
/// # Errors
///
/// Returns `SeedError::InvalidFixture` if a rating is outside 1..=5.
pub fn testimonials() -> Result<Vec<NewTestimonial>, SeedError> {
    let quotes: [(&str, &str, Option<&str>, i64, bool); 4] = [
        (
            "My daughter has played with the stacker every single day for a year.",
            "Priya S.",
            Some("Mum of two"),
            5,
            true,
        ),
        (
            "Beautifully made and arrived gift-wrapped. Grandparent approved!",
            "Rahul M.",
            Some("Grandfather"),
            5,
            true,
        ),
        (
            "The shape sorter kept my toddler busy through a whole train journey.",
            "Ananya K.",
            None,
            4,
            true,
        ),
        (
            "Quick delivery and lovely customer service when I needed to swap a size.",
            "Vikram P.",
            Some("Dad"),
            4,
            false,
        ),
    ];

    quotes
        .into_iter()
        .enumerate()
        .map(|(i, (quote, author, role, rating, featured))| {
            let index = i32::try_from(i).unwrap_or(i32::MAX);
            Ok(NewTestimonial {
                id: TestimonialId::new(index + 1),
                quote: quote.to_string(),
                author: author.to_string(),
                role: role.map(str::to_string),
                image: None,
                rating: Rating::new(rating)
                    .map_err(|e| SeedError::InvalidFixture(format!("{author}: {e}")))?,
                is_featured: featured,
                sort_order: index,
            })
        })
        .collect()
}

/// Offer fixtures. Only the first is active.
#[must_use]
pub fn offers() -> Vec<NewOffer> {
    vec![
        NewOffer {
            id: OfferId::new(1),
            message: "Free shipping on orders over ₹999".to_string(),
            href: Some("/shipping".to_string()),
            is_active: true,
        },
        NewOffer {
            id: OfferId::new(2),
            message: "Festive sale: 20% off wooden toys".to_string(),
            href: Some("/collections/wooden-toys".to_string()),
            is_active: false,
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parse() {
        assert_eq!("hero-slides".parse::<SeedTarget>(), Ok(SeedTarget::HeroSlides));
        assert_eq!("all".parse::<SeedTarget>(), Ok(SeedTarget::All));
        assert_eq!(
            "users".parse::<SeedTarget>(),
            Err(UnknownTarget("users".to_string()))
        );
    }

    #[test]
    fn test_all_target_invalidates_every_content_tag() {
        assert_eq!(
            SeedTarget::All.cache_tags(),
            ["blogs", "hero-slides", "testimonials", "offers"]
        );
        assert_eq!(SeedTarget::Offers.cache_tags(), ["offers"]);
    }

    #[test]
    fn test_blog_fixtures_have_unique_slugs() {
        let blogs = blogs().unwrap();
        let mut slugs: Vec<_> = blogs.iter().map(|b| b.id.as_str()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), blogs.len());
        assert_eq!(
            blogs[0].id.as_str(),
            "choosing-toys-that-grow-with-your-child"
        );
    }

    #[test]
    fn test_hero_slide_fixtures() {
        let slides = hero_slides();
        assert_eq!(slides.len(), 6);
        assert_eq!(slides.iter().filter(|s| s.is_for_mobile).count(), 3);

        let mut ids: Vec<_> = slides.iter().map(|s| s.id.as_i32()).collect();
        ids.dedup();
        assert_eq!(ids, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_testimonial_fixtures_have_valid_ratings() {
        let testimonials = testimonials().unwrap();
        assert!(testimonials.iter().all(|t| (1..=5).contains(&t.rating.get())));
        assert_eq!(testimonials.iter().filter(|t| t.is_featured).count(), 3);
    }

    #[test]
    fn test_single_offer_active() {
        assert_eq!(offers().iter().filter(|o| o.is_active).count(), 1);
    }
}
