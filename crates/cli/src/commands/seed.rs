//! Fixture seeding.

use joy_junction_storefront::db;
use joy_junction_storefront::seed::{self, SeedError, SeedTarget};
use thiserror::Error;
use tracing::info;

use super::{CommandError, database_url};

#[derive(Debug, Error)]
pub enum SeedCommandError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Seeding failed: {0}")]
    Seed(#[from] SeedError),
}

/// Upsert the built-in fixtures for `target`.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a fixture cannot be written.
pub async fn fixtures(target: SeedTarget) -> Result<(), SeedCommandError> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;

    info!(seed_target = %target, "Seeding fixtures...");
    let report = seed::seed(&pool, target).await?;

    for (content, rows) in report.iter() {
        info!(content, rows, "Seeded");
    }
    info!("Seeding complete! Revalidate the affected tags to refresh cached pages.");
    Ok(())
}
