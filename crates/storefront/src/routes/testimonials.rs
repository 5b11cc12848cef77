//! Testimonial route handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::cache::{CacheKey, tags};
use crate::db::TestimonialRepository;
use crate::error::{AppError, Result};
use crate::models::Testimonial;
use crate::state::AppState;

use super::{ApiResponse, data, parse_flag};

#[derive(Debug, Deserialize)]
pub struct TestimonialQuery {
    pub featured: Option<String>,
}

/// List testimonials in display order. `?featured=true` keeps only featured
/// ones.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<TestimonialQuery>,
) -> Result<Json<ApiResponse<Arc<Vec<Testimonial>>>>> {
    let featured_only = parse_flag("featured", query.featured.as_deref())
        .map_err(|detail| AppError::Validation(vec![detail]))?
        .unwrap_or(false);

    let testimonials = state
        .cache()
        .get_or_load(
            CacheKey::Testimonials { featured_only },
            &[tags::TESTIMONIALS.to_string()],
            || async {
                TestimonialRepository::new(state.pool())
                    .list(featured_only)
                    .await
                    .map(Arc::new)
            },
        )
        .await?;

    Ok(data(testimonials))
}
