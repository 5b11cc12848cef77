//! Testimonial repository.

use sqlx::PgPool;

use super::{RepositoryError, sync_serial_sequence};
use crate::models::{NewTestimonial, Testimonial};

pub struct TestimonialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TestimonialRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List testimonials by `(sort_order, created_at)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, featured_only: bool) -> Result<Vec<Testimonial>, RepositoryError> {
        let testimonials = sqlx::query_as::<_, Testimonial>(
            r"
            SELECT id, quote, author, role, image, rating, is_featured, sort_order, created_at
            FROM content.testimonial
            WHERE (NOT $1 OR is_featured)
            ORDER BY sort_order, created_at, id
            ",
        )
        .bind(featured_only)
        .fetch_all(self.pool)
        .await?;
        Ok(testimonials)
    }

    /// Insert or update testimonials by id in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on constraint violations and
    /// `RepositoryError::Database` for other failures.
    pub async fn upsert_all(
        &self,
        testimonials: &[NewTestimonial],
    ) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for t in testimonials {
            sqlx::query(
                r"
                INSERT INTO content.testimonial
                    (id, quote, author, role, image, rating, is_featured, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO UPDATE SET
                    quote = EXCLUDED.quote,
                    author = EXCLUDED.author,
                    role = EXCLUDED.role,
                    image = EXCLUDED.image,
                    rating = EXCLUDED.rating,
                    is_featured = EXCLUDED.is_featured,
                    sort_order = EXCLUDED.sort_order
                ",
            )
            .bind(t.id)
            .bind(&t.quote)
            .bind(&t.author)
            .bind(&t.role)
            .bind(&t.image)
            .bind(t.rating)
            .bind(t.is_featured)
            .bind(t.sort_order)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from_write)?;
        }

        sync_serial_sequence(&mut tx, "content.testimonial").await?;
        tx.commit().await?;
        Ok(testimonials.len())
    }
}
