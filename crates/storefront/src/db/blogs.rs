//! Blog repository.

use sqlx::PgPool;

use joy_junction_core::Slug;

use super::RepositoryError;
use crate::models::{Blog, NewBlog};

const BLOG_COLUMNS: &str = "id, title, published_at, category, image, excerpt, content, \
                            author, author_image, created_at, updated_at";

/// Repository for blog database operations.
pub struct BlogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List posts newest first, optionally filtered by category.
    ///
    /// `limit` of `None` returns every matching post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Blog>, RepositoryError> {
        let sql = format!(
            "SELECT {BLOG_COLUMNS} FROM content.blog \
             WHERE ($1::text IS NULL OR category = $1) \
             ORDER BY published_at DESC, id \
             LIMIT $2"
        );
        let blogs = sqlx::query_as::<_, Blog>(&sql)
            .bind(category)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(blogs)
    }

    /// Get a post by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, slug: &Slug) -> Result<Option<Blog>, RepositoryError> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM content.blog WHERE id = $1");
        let blog = sqlx::query_as::<_, Blog>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(blog)
    }

    /// Distinct categories in alphabetical order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM content.blog ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Insert or update posts by slug in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on constraint violations and
    /// `RepositoryError::Database` for other failures.
    pub async fn upsert_all(&self, blogs: &[NewBlog]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for blog in blogs {
            sqlx::query(
                r"
                INSERT INTO content.blog
                    (id, title, published_at, category, image, excerpt, content, author, author_image)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (id) DO UPDATE SET
                    title = EXCLUDED.title,
                    published_at = EXCLUDED.published_at,
                    category = EXCLUDED.category,
                    image = EXCLUDED.image,
                    excerpt = EXCLUDED.excerpt,
                    content = EXCLUDED.content,
                    author = EXCLUDED.author,
                    author_image = EXCLUDED.author_image
                ",
            )
            .bind(&blog.id)
            .bind(&blog.title)
            .bind(blog.published_at)
            .bind(&blog.category)
            .bind(&blog.image)
            .bind(&blog.excerpt)
            .bind(&blog.content)
            .bind(&blog.author)
            .bind(&blog.author_image)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from_write)?;
        }

        tx.commit().await?;
        Ok(blogs.len())
    }
}
