//! Database operations for the storefront content database.
//!
//! # Schema: `content`
//!
//! Stores first-party content only (the commerce backend is the source of
//! truth for products, carts and orders):
//!
//! ## Tables
//!
//! - `blog` - Blog posts keyed by slug
//! - `hero_slide` - Home page carousel slides
//! - `testimonial` - Customer testimonials
//! - `offer` - Announcement bar offers
//!
//! Rows are written only by seeding (dev-only endpoints and the CLI).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p joy-junction-cli -- migrate
//! ```

pub mod blogs;
pub mod hero_slides;
pub mod offers;
pub mod testimonials;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use blogs::BlogRepository;
pub use hero_slides::HeroSlideRepository;
pub use offers::OfferRepository;
pub use testimonials::TestimonialRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Constraint violation (e.g., rating out of range).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique/check violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_write(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && (db_err.is_unique_violation() || db_err.is_check_violation())
        {
            return Self::Conflict(db_err.message().to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Bump a SERIAL sequence past explicitly inserted ids.
pub(crate) async fn sync_serial_sequence(
    conn: &mut sqlx::PgConnection,
    table: &str,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
         COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
    );
    sqlx::query(&sql).execute(conn).await?;
    Ok(())
}
