pub mod compare;
pub mod config;
pub mod db;
pub mod functions;
pub mod helpers;
pub mod models;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use store::{SessionCoordinator, StoreError};

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionCoordinator>,
}

impl AppState {
    pub fn new(sessions: SessionCoordinator) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }
}

/// `max_body_size` bounds every request body, session saves and uploads
/// alike.
pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    use functions::{
        delete_session::delete_session,
        get_sessions::{get_session, get_sessions},
        health::health,
        plot_statistics::plot_statistics,
        save_session::save_session,
        upload_file::upload_file,
    };

    Router::new()
        .route("/health", get(health))
        .route("/sessions", get(get_sessions).post(save_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route(
            "/sessions/:id/plots/:plot_id/statistics",
            get(plot_statistics),
        )
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Internal(e) => {
                error!("request failed: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidId(message) => AppError::BadRequest(message),
            other => AppError::Internal(other.into()),
        }
    }
}
