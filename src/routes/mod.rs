// ABOUTME: Read-only HTTP routes served next to the A2A endpoints.
// ABOUTME: Bucket file downloads plus session listing and message history for the web UI.

mod bucket;
mod sessions;

use a2adk_agent::SessionService;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct RoutesState {
    pub sessions: Arc<dyn SessionService>,
    /// Directory served under /buckets; `None` serves nothing
    pub bucket_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("{0}")]
    NotFound(String),
    #[error("Path is outside the bucket")]
    PathTraversal,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = match &self {
            RouteError::NotFound(_) => StatusCode::NOT_FOUND,
            RouteError::PathTraversal => StatusCode::BAD_REQUEST,
            RouteError::Io(_) | RouteError::Internal(_) => {
                tracing::error!(error = %self, "Route failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn custom_router(state: RoutesState) -> Router {
    Router::new()
        .route("/buckets/{*filepath}", get(bucket::get_bucket_file))
        .route(
            "/apps/{app_name}/users/{user_id}/sessions",
            get(sessions::list_sessions),
        )
        .route(
            "/apps/{app_name}/users/{user_id}/sessions/{session_id}/messages",
            get(sessions::get_session_messages),
        )
        .with_state(Arc::new(state))
}
