//! Hero slide repository.

use sqlx::PgPool;

use super::{RepositoryError, sync_serial_sequence};
use crate::models::{HeroSlide, NewHeroSlide};

pub struct HeroSlideRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> HeroSlideRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List slides by `(sort_order, created_at)`.
    ///
    /// `for_mobile` of `None` returns both desktop and mobile artwork.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, for_mobile: Option<bool>) -> Result<Vec<HeroSlide>, RepositoryError> {
        let slides = sqlx::query_as::<_, HeroSlide>(
            r"
            SELECT id, src, alt, href, is_for_mobile, sort_order, duration, created_at
            FROM content.hero_slide
            WHERE ($1::boolean IS NULL OR is_for_mobile = $1)
            ORDER BY sort_order, created_at, id
            ",
        )
        .bind(for_mobile)
        .fetch_all(self.pool)
        .await?;
        Ok(slides)
    }

    /// Insert or update slides by id in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on constraint violations and
    /// `RepositoryError::Database` for other failures.
    pub async fn upsert_all(&self, slides: &[NewHeroSlide]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for slide in slides {
            sqlx::query(
                r"
                INSERT INTO content.hero_slide (id, src, alt, href, is_for_mobile, sort_order, duration)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id) DO UPDATE SET
                    src = EXCLUDED.src,
                    alt = EXCLUDED.alt,
                    href = EXCLUDED.href,
                    is_for_mobile = EXCLUDED.is_for_mobile,
                    sort_order = EXCLUDED.sort_order,
                    duration = EXCLUDED.duration
                ",
            )
            .bind(slide.id)
            .bind(&slide.src)
            .bind(&slide.alt)
            .bind(&slide.href)
            .bind(slide.is_for_mobile)
            .bind(slide.sort_order)
            .bind(slide.duration)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from_write)?;
        }

        sync_serial_sequence(&mut tx, "content.hero_slide").await?;
        tx.commit().await?;
        Ok(slides.len())
    }
}
