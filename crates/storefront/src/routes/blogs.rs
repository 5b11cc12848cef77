//! Blog route handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use joy_junction_core::Slug;

use crate::cache::{CacheKey, tags};
use crate::db::{BlogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::Blog;
use crate::state::AppState;

use super::{ApiResponse, data};

/// Largest page a client may ask for.
pub const MAX_LIMIT: i64 = 100;

/// Query parameters for the blog listing.
#[derive(Debug, Default, Deserialize)]
pub struct BlogListQuery {
    pub category: Option<String>,
    pub limit: Option<String>,
}

impl BlogListQuery {
    /// Validated `(category, limit)`.
    fn validate(self) -> Result<(Option<String>, Option<i64>)> {
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if (1..=MAX_LIMIT).contains(&n) => Some(n),
                _ => {
                    return Err(AppError::Validation(vec![format!(
                        "limit: must be an integer between 1 and {MAX_LIMIT}"
                    )]));
                }
            },
        };

        Ok((category, limit))
    }
}

/// List blog posts, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<ApiResponse<Arc<Vec<Blog>>>>> {
    let (category, limit) = query.validate()?;

    let key = CacheKey::Blogs {
        category: category.clone(),
        limit,
    };
    let blogs = state
        .cache()
        .get_or_load(key, &[tags::BLOGS.to_string()], || async {
            BlogRepository::new(state.pool())
                .list(category.as_deref(), limit)
                .await
                .map(Arc::new)
        })
        .await?;

    Ok(data(blogs))
}

/// List distinct blog categories.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<ApiResponse<Arc<Vec<String>>>>> {
    let categories = state
        .cache()
        .get_or_load(
            CacheKey::BlogCategories,
            &[tags::BLOGS.to_string()],
            || async {
                BlogRepository::new(state.pool())
                    .categories()
                    .await
                    .map(Arc::new)
            },
        )
        .await?;

    Ok(data(categories))
}

/// Show a single blog post.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Arc<Blog>>>> {
    // Anything that isn't a valid slug can't name a post
    let slug = Slug::parse(&slug).map_err(|_| AppError::NotFound("Blog post".to_string()))?;

    let blog_tags = [tags::BLOGS.to_string(), tags::blog(slug.as_str())];
    let blog = state
        .cache()
        .get_or_load(CacheKey::Blog(slug.clone()), &blog_tags, || async {
            Ok::<_, RepositoryError>(BlogRepository::new(state.pool()).get(&slug).await?.map(Arc::new))
        })
        .await?;

    blog.map(data)
        .ok_or_else(|| AppError::NotFound("Blog post".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    use super::*;
    use crate::config::Environment;
    use crate::routes::tests::{body_json, send, test_app};

    fn query(category: Option<&str>, limit: Option<&str>) -> BlogListQuery {
        BlogListQuery {
            category: category.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_defaults() {
        let (category, limit) = query(None, None).validate().unwrap();
        assert_eq!(category, None);
        assert_eq!(limit, None);
    }

    #[test]
    fn test_validate_blank_category_is_none() {
        let (category, limit) = query(Some("  "), Some("10")).validate().unwrap();
        assert_eq!(category, None);
        assert_eq!(limit, Some(10));
    }

    #[test]
    fn test_validate_limit_bounds() {
        assert!(query(None, Some("1")).validate().is_ok());
        assert!(query(None, Some("100")).validate().is_ok());
        assert!(query(None, Some("0")).validate().is_err());
        assert!(query(None, Some("101")).validate().is_err());
        assert!(query(None, Some("ten")).validate().is_err());
    }

    #[tokio::test]
    async fn test_invalid_limit_returns_details() {
        let app = test_app(Environment::Development);
        let response = send(
            app,
            Request::get("/api/blogs?limit=500").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"][0], "limit: must be an integer between 1 and 100");
    }

    #[tokio::test]
    async fn test_invalid_slug_is_not_found() {
        let app = test_app(Environment::Development);
        let response = send(
            app,
            Request::get("/api/blogs/Not_A_Slug").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Blog post not found");
    }
}
