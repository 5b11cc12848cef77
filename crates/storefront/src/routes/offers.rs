//! Announcement bar offers.

use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::instrument;

use crate::cache::{CacheKey, tags};
use crate::db::OfferRepository;
use crate::error::Result;
use crate::models::Offer;
use crate::state::AppState;

use super::{ApiResponse, data};

/// List active offers, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<ApiResponse<Arc<Vec<Offer>>>>> {
    let offers = state
        .cache()
        .get_or_load(CacheKey::Offers, &[tags::OFFERS.to_string()], || async {
            OfferRepository::new(state.pool())
                .list_active()
                .await
                .map(Arc::new)
        })
        .await?;

    Ok(data(offers))
}
