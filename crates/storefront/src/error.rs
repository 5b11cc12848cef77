//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Every error response uses the same JSON envelope:
//!
//! ```json
//! { "error": "Validation failed", "details": ["email: email must contain an @ symbol"] }
//! ```

use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::commerce::CommerceError;
use crate::db::RepositoryError;
use crate::search::SearchError;
use crate::services::email::EmailError;
use crate::services::revalidate::RevalidateError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Commerce backend operation failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Email provider operation failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Search index operation failed.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Rendering layer revalidation failed.
    #[error("Revalidation error: {0}")]
    Revalidate(#[from] RevalidateError),

    /// Input failed validation; each entry describes one problem.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal caller did not present the shared secret.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Endpoint is disabled in this environment.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Client exceeded its request budget.
    #[error("Too many requests, retry after {} seconds", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// An upstream dependency could not be reached.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Email(_) | Self::Search(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Commerce(CommerceError::NotFound(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Commerce(_) => StatusCode::BAD_GATEWAY,
            Self::Revalidate(RevalidateError::Unreachable(_)) | Self::ServiceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Revalidate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Seconds until a rate-limited client may retry, rounded up.
    fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } => {
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                Some(secs.max(1))
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let (message, details) = match &self {
            Self::Database(_) | Self::Email(_) | Self::Search(_) | Self::Internal(_) => {
                ("Internal server error".to_string(), None)
            }
            Self::Commerce(CommerceError::NotFound(what)) | Self::NotFound(what) => {
                (format!("{what} not found"), None)
            }
            Self::Commerce(_) => ("Commerce service error".to_string(), None),
            Self::Revalidate(RevalidateError::Unreachable(_)) => {
                ("Revalidation service unavailable".to_string(), None)
            }
            Self::Revalidate(_) => ("Revalidation failed".to_string(), None),
            Self::Validation(details) => ("Validation failed".to_string(), Some(details.clone())),
            Self::Unauthorized(_) => ("Unauthorized".to_string(), None),
            Self::Forbidden(msg) | Self::ServiceUnavailable(msg) => (msg.clone(), None),
            Self::RateLimited { .. } => (
                "Too many requests. Please try again later.".to_string(),
                None,
            ),
        };

        let retry_after = self.retry_after_secs();
        let body = ErrorBody {
            error: message,
            details,
            retry_after,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for internal actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Blog".to_string());
        assert_eq!(err.to_string(), "Not found: Blog");

        let err = AppError::Validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Validation failed: a; b");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Validation(vec![])),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::RateLimited {
                retry_after: Duration::from_secs(5)
            }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::ServiceUnavailable("x".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Commerce(CommerceError::NotFound("p".to_string()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Commerce(CommerceError::RateLimited(3))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Revalidate(RevalidateError::Upstream {
                status: 500,
                message: String::new()
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_has_details() {
        let response =
            AppError::Validation(vec!["email: email cannot be empty".to_string()]).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"][0], "email: email cannot be empty");
    }

    #[tokio::test]
    async fn test_internal_error_is_generic() {
        let response = AppError::Internal("db password is hunter2".to_string()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited {
            retry_after: Duration::from_millis(12_300),
        }
        .into_response();
        assert_eq!(response.headers()[RETRY_AFTER], "13");
        let body = body_json(response).await;
        assert_eq!(body["retryAfter"], 13);
    }
}
