//! Offer repository.

use sqlx::PgPool;

use super::{RepositoryError, sync_serial_sequence};
use crate::models::{NewOffer, Offer};

pub struct OfferRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OfferRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active offers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Offer>, RepositoryError> {
        let offers = sqlx::query_as::<_, Offer>(
            r"
            SELECT id, message, href, is_active, created_at
            FROM content.offer
            WHERE is_active
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(offers)
    }

    /// Insert or update offers by id in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a write fails.
    pub async fn upsert_all(&self, offers: &[NewOffer]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for offer in offers {
            sqlx::query(
                r"
                INSERT INTO content.offer (id, message, href, is_active)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE SET
                    message = EXCLUDED.message,
                    href = EXCLUDED.href,
                    is_active = EXCLUDED.is_active
                ",
            )
            .bind(offer.id)
            .bind(&offer.message)
            .bind(&offer.href)
            .bind(offer.is_active)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from_write)?;
        }

        sync_serial_sequence(&mut tx, "content.offer").await?;
        tx.commit().await?;
        Ok(offers.len())
    }
}
