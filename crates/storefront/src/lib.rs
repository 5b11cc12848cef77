//! The Joy Junction storefront content service.
//!
//! A JSON API consumed by the storefront's rendering layer: blog posts, hero
//! slides, testimonials and offers from `PostgreSQL`, product description
//! sectioning and search over the commerce backend's catalogue, newsletter
//! and contact forms over a transactional email provider, and tag-based
//! revalidation of cached pages.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod commerce;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod search;
pub mod seed;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{Request, Response, StatusCode},
    middleware::from_fn,
    routing::get,
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    rate_limit::RateLimiterLayer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Build the full application router.
///
/// `api_limiter` is layered over `/api` only; the server passes
/// [`middleware::api_rate_limiter`], which needs the peer address, so the
/// router must then be served with connect info.
pub fn app(state: AppState, api_limiter: Option<RateLimiterLayer>) -> Router {
    let api = match api_limiter {
        Some(limiter) => routes::routes().layer(limiter),
        None => routes::routes(),
    };

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
