/// HTTP transport for the search service
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::search::SearchEngine;
use crate::types::SearchResponse;

pub struct AppState {
    pub engine: SearchEngine,
}

/// Error shape returned to HTTP clients
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: &str) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            detail: detail.to_string(),
        }
    }

    fn internal() -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.detail }));
        (self.status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// Search for instruments using the free-text resolver.
/// Example: /search?q=Nifty 27 Jan
async fn search_endpoint(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("Query string 'q' cannot be empty"));
    }

    match state.engine.search(query).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            error!(code = err.error_code(), "Search failed: {}", err);
            Err(ApiError::internal())
        }
    }
}

/// Health check
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Trade search API is running. Go to /search?q=nifty"
    }))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/search", get(search_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
