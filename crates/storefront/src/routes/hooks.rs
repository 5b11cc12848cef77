//! Commerce backend webhooks.
//!
//! The backend posts product lifecycle events here so the search index
//! tracks the catalogue without a full re-sync.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cache::tags;
use crate::error::{AppError, Result};
use crate::search::{SyncOutcome, remove_product, sync_product};
use crate::state::AppState;

use super::{ApiResponse, body_error, data, require_secret};

/// Product lifecycle events understood by the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ProductEvent {
    #[serde(rename = "product.created")]
    Created,
    #[serde(rename = "product.updated")]
    Updated,
    #[serde(rename = "product.deleted")]
    Deleted,
}

#[derive(Debug, Deserialize)]
pub struct ProductRef {
    pub id: String,
}

/// Webhook payload: `{"event": "product.updated", "data": {"id": "prod_..."}}`.
#[derive(Debug, Deserialize)]
pub struct ProductHook {
    pub event: ProductEvent,
    pub data: ProductRef,
}

#[derive(Debug, Serialize)]
pub struct ProductHookResponse {
    pub id: String,
    /// `indexed` or `removed`.
    pub outcome: &'static str,
    pub revalidated: bool,
}

/// Re-index or drop a product, then revalidate product pages.
///
/// Revalidation is best-effort; the index update is what the backend is
/// told about.
#[instrument(skip_all)]
pub async fn products(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<ProductHook>, JsonRejection>,
) -> Result<Json<ApiResponse<ProductHookResponse>>> {
    require_secret(&state, &headers)?;

    let Json(hook) = body.map_err(|e| body_error(&e))?;
    let id = hook.data.id.trim().to_string();
    if id.is_empty() {
        return Err(AppError::Validation(vec![
            "data.id: product id is required".to_string(),
        ]));
    }

    let outcome = match hook.event {
        ProductEvent::Created | ProductEvent::Updated => {
            sync_product(state.search(), state.commerce(), &id).await?
        }
        ProductEvent::Deleted => {
            state.commerce().invalidate_all().await;
            remove_product(state.search(), &id)?;
            SyncOutcome::Removed
        }
    };

    let revalidated = match state.revalidator().revalidate(tags::PRODUCTS).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "Product revalidation failed");
            false
        }
    };

    info!(id = %id, event = ?hook.event, outcome = ?outcome, "Product hook processed");
    Ok(data(ProductHookResponse {
        id,
        outcome: match outcome {
            SyncOutcome::Indexed => "indexed",
            SyncOutcome::Removed => "removed",
        },
        revalidated,
    }))
}
