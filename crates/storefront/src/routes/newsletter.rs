//! Newsletter subscription route handler.
//!
//! Sends the subscriber a welcome email and tells the store inbox. There is
//! no subscriber list; the inbox notification is the record.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use joy_junction_core::Email;

use crate::error::{AppError, Result};
use crate::middleware::{RateDecision, client_key};
use crate::state::AppState;

use super::{ApiResponse, body_error, data};

/// Newsletter subscription request.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub subscribed: bool,
}

/// Subscribe to the newsletter.
///
/// The per-client budget is charged before the body is looked at, so
/// malformed requests count too.
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SubscribeResponse>>> {
    let client = client_key(&headers);
    if let RateDecision::Limited { retry_after } = state.newsletter_limiter().check(&client) {
        warn!(client = %client, "Newsletter rate limit exceeded");
        return Err(AppError::RateLimited { retry_after });
    }

    let Json(request) = body.map_err(|e| body_error(&e))?;
    let email = Email::normalize(&request.email)
        .map_err(|e| AppError::Validation(vec![format!("email: {e}")]))?;

    let mailer = state.email().ok_or_else(|| {
        AppError::ServiceUnavailable("Email service is not configured".to_string())
    })?;

    mailer.send_newsletter_welcome(&email).await?;

    if let Err(e) = mailer.send_newsletter_notification(&email).await {
        warn!(error = %e, "Failed to notify store inbox of new subscriber");
    }

    info!(email = %email, "Newsletter subscription successful");
    Ok(data(SubscribeResponse { subscribed: true }))
}
