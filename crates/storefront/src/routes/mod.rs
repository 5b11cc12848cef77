//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! # Content (cached, tag-invalidated)
//! GET  /api/blogs                  - Blog posts (?category=&limit=)
//! GET  /api/blogs/categories       - Distinct blog categories
//! GET  /api/blogs/{slug}           - Single blog post
//! GET  /api/hero-slides            - Home page hero slides (?mobile=)
//! GET  /api/testimonials           - Testimonials (?featured=)
//! GET  /api/offers                 - Active announcement bar offers
//!
//! # Products
//! GET  /api/products/{handle}/description - Sectioned product description
//! GET  /api/search                 - Product and blog search (?q=&type=&limit=)
//!
//! # Forms
//! POST /api/newsletter             - Newsletter sign-up (5 per 10 minutes)
//! POST /api/contact                - Contact form
//!
//! # Internal (shared secret when configured)
//! POST /api/revalidate             - Invalidate caches for a content tag
//! POST /api/hooks/products         - Commerce backend product events
//! POST /api/seed/{target}          - Load fixture content (not in production)
//! ```
//!
//! Successful responses are wrapped as `{"data": ...}`; failures use the
//! [`AppError`](crate::error::AppError) envelope.

pub mod blogs;
pub mod contact;
pub mod hooks;
pub mod newsletter;
pub mod offers;
pub mod products;
pub mod revalidate;
pub mod search;
pub mod seed;
pub mod slides;
pub mod testimonials;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::HeaderMap,
    routing::{get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::services::revalidate::SECRET_HEADER;
use crate::state::AppState;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Wrap `data` in the success envelope.
pub const fn data<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { data })
}

/// Turn a JSON body rejection into a validation error.
pub(crate) fn body_error(rejection: &JsonRejection) -> AppError {
    AppError::Validation(vec![format!("body: {}", rejection.body_text())])
}

/// Reject internal calls that don't carry the revalidation secret.
pub(crate) fn require_secret(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if state.revalidator().accepts_secret(presented) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "missing or invalid {SECRET_HEADER} header"
        )))
    }
}

/// Parse an optional boolean query parameter (`true`/`false`, `1`/`0`).
pub(crate) fn parse_flag(name: &str, raw: Option<&str>) -> Result<Option<bool>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some("true" | "1") => Ok(Some(true)),
        Some("false" | "0") => Ok(Some(false)),
        Some(other) => Err(format!("{name}: expected true or false, got '{other}'")),
    }
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blogs::index))
        .route("/categories", get(blogs::categories))
        .route("/{slug}", get(blogs::show))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/blogs", blog_routes())
        .route("/hero-slides", get(slides::index))
        .route("/testimonials", get(testimonials::index))
        .route("/offers", get(offers::index))
        .route("/products/{handle}/description", get(products::description))
        .route("/search", get(search::search))
        .route("/newsletter", post(newsletter::subscribe))
        .route("/contact", post(contact::submit))
        .route("/revalidate", post(revalidate::revalidate))
        .route("/hooks/products", post(hooks::products))
        .route("/seed/{target}", post(seed::seed))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}
