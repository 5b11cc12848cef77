//! Tag-based revalidation endpoint.
//!
//! Called by the CMS or an operator after content changes. Drops matching
//! entries from the local content cache, then forwards the resolved tags to
//! the rendering layer so its cached pages are rebuilt.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::cache::tags;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::revalidate::resolve_tags;
use crate::state::AppState;

use super::{ApiResponse, body_error, data, require_secret};

#[derive(Debug, Deserialize)]
pub struct RevalidateRequest {
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    pub tags: Vec<String>,
    /// Unix time in milliseconds.
    pub now: i64,
}

/// Revalidate everything cached under a content tag.
#[instrument(skip_all)]
pub async fn revalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<RevalidateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RevalidateResponse>>> {
    require_secret(&state, &headers)?;

    let Json(request) = body.map_err(|e| body_error(&e))?;
    let tag = request.tag.as_deref().map(str::trim).unwrap_or_default();
    if tag.is_empty() {
        return Err(AppError::Validation(vec!["tag: tag is required".to_string()]));
    }

    add_breadcrumb("revalidate", "Revalidating content tag", Some(&[("tag", tag)][..]));

    let resolved = resolve_tags(tag);
    let dropped = state.cache().invalidate_tags(&resolved).await;
    if resolved.iter().any(|t| t == tags::PRODUCTS) {
        state.commerce().invalidate_all().await;
    }

    let tags = state.revalidator().revalidate(tag).await?;

    info!(tag, dropped, "Content revalidated");
    Ok(data(RevalidateResponse {
        revalidated: true,
        tags,
        now: Utc::now().timestamp_millis(),
    }))
}
