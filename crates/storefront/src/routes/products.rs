//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use joy_junction_core::ProductDescription;

use crate::error::Result;
use crate::state::AppState;

use super::{ApiResponse, data};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionResponse {
    pub handle: String,
    pub title: String,
    #[serde(flatten)]
    pub description: ProductDescription,
}

/// Fetch a product by handle and split its description into sections.
#[instrument(skip(state))]
pub async fn description(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<ApiResponse<DescriptionResponse>>> {
    let product = state.commerce().get_product_by_handle(&handle).await?;
    let description = ProductDescription::parse(product.description.as_deref().unwrap_or_default());

    Ok(data(DescriptionResponse {
        handle: product.handle,
        title: product.title,
        description,
    }))
}
