//! Hero slide route handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::cache::{CacheKey, tags};
use crate::db::HeroSlideRepository;
use crate::error::{AppError, Result};
use crate::models::HeroSlide;
use crate::state::AppState;

use super::{ApiResponse, data, parse_flag};

#[derive(Debug, Deserialize)]
pub struct SlideQuery {
    pub mobile: Option<String>,
}

/// List hero slides in display order, optionally only mobile or desktop ones.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<SlideQuery>,
) -> Result<Json<ApiResponse<Arc<Vec<HeroSlide>>>>> {
    let mobile = parse_flag("mobile", query.mobile.as_deref())
        .map_err(|detail| AppError::Validation(vec![detail]))?;

    let slides = state
        .cache()
        .get_or_load(
            CacheKey::HeroSlides { mobile },
            &[tags::HERO_SLIDES.to_string()],
            || async {
                HeroSlideRepository::new(state.pool())
                    .list(mobile)
                    .await
                    .map(Arc::new)
            },
        )
        .await?;

    Ok(data(slides))
}
