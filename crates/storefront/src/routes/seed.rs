//! Development-only fixture loading.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result};
use crate::search::index_blogs;
use crate::seed::{self as fixtures, SeedReport, SeedTarget};
use crate::state::AppState;

use super::{ApiResponse, data};

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub seeded: SeedReport,
}

/// Upsert fixture content for `target` and drop the affected cache entries.
#[instrument(skip(state))]
pub async fn seed(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<SeedResponse>>> {
    if state.config().environment.is_production() {
        warn!(seed_target = %name, "Seed request rejected in production");
        return Err(AppError::Forbidden(
            "Seeding is disabled in production".to_string(),
        ));
    }

    let target: SeedTarget = name
        .parse()
        .map_err(|_| AppError::NotFound(format!("Seed target '{name}'")))?;

    let seeded = fixtures::seed(state.pool(), target).await?;
    let dropped = state.cache().invalidate_tags(&target.cache_tags()).await;

    if seeded.get(SeedTarget::Blogs).is_some() {
        let indexed = index_blogs(state.search(), state.pool()).await;
        info!(indexed, "Re-indexed seeded blog posts");
    }

    info!(seed_target = %target, dropped, "Fixtures seeded");
    Ok(data(SeedResponse { seeded }))
}
