//! Search route handler.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::search::{IndexType, SearchResults};
use crate::state::AppState;

use super::{ApiResponse, data};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;
const MAX_QUERY_CHARS: usize = 200;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub index_type: Option<String>,
    pub limit: Option<String>,
}

impl SearchQuery {
    fn validate(self) -> std::result::Result<(String, Option<IndexType>, usize), Vec<String>> {
        let mut details = Vec::new();

        let q = self.q.unwrap_or_default();
        if q.chars().count() > MAX_QUERY_CHARS {
            details.push(format!("q: must be at most {MAX_QUERY_CHARS} characters"));
        }

        let index_type = match self.index_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => IndexType::parse(raw).or_else(|| {
                details.push(format!("type: expected product or blog, got '{raw}'"));
                None
            }),
        };

        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_LIMIT,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if (1..=MAX_LIMIT).contains(&n) => n,
                _ => {
                    details.push(format!("limit: must be an integer between 1 and {MAX_LIMIT}"));
                    DEFAULT_LIMIT
                }
            },
        };

        if details.is_empty() {
            Ok((q, index_type, limit))
        } else {
            Err(details)
        }
    }
}

/// Search products and blog posts.
///
/// An empty query returns no hits.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchResults>>> {
    let (q, index_type, limit) = query.validate().map_err(AppError::Validation)?;
    let results = state.search().search(index_type, &q, limit)?;
    Ok(data(results))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    use super::*;
    use crate::config::Environment;
    use crate::routes::tests::{body_json, send, test_state};
    use crate::routes::routes;
    use crate::search::SearchDocument;

    #[test]
    fn test_validate_defaults() {
        let (q, index_type, limit) = SearchQuery::default().validate().unwrap();
        assert_eq!(q, "");
        assert_eq!(index_type, None);
        assert_eq!(limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_validate_collects_problems() {
        let details = SearchQuery {
            q: Some("x".repeat(201)),
            index_type: Some("collection".to_string()),
            limit: Some("0".to_string()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(details.len(), 3);
    }

    #[tokio::test]
    async fn test_search_filters_by_type() {
        let state = test_state(crate::config::tests::test_config(Environment::Development));
        state
            .search()
            .index_data(
                IndexType::Product,
                &[SearchDocument {
                    object_id: "prod_1".to_string(),
                    handle: "wooden-train".to_string(),
                    title: "Wooden Train".to_string(),
                    ..Default::default()
                }],
            )
            .unwrap();
        state
            .search()
            .index_data(
                IndexType::Blog,
                &[SearchDocument {
                    object_id: "train-games".to_string(),
                    handle: "train-games".to_string(),
                    title: "Train Games for Toddlers".to_string(),
                    ..Default::default()
                }],
            )
            .unwrap();

        let app = routes().with_state(state);
        let response = send(
            app.clone(),
            Request::get("/api/search?q=train").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["hits"].as_array().unwrap().len(), 2);

        let response = send(
            app,
            Request::get("/api/search?q=train&type=blog")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let body = body_json(response).await;
        let hits = body["data"]["hits"].as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["indexType"], "blog");
        assert_eq!(hits[0]["objectId"], "train-games");
    }
}
