use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::checked_id;
use crate::{models::Session, store::SessionStore, AppError, AppState};

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct SessionsQuery {
    pub order: Option<String>,
}

/// Lists every session of the primary backend, keyed by id. With
/// `?order=recent` the sessions come back as an array, newest first.
pub async fn get_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionsQuery>,
) -> Result<Response, AppError> {
    let sessions = state.sessions.get_all().await?;

    match query.order.as_deref() {
        None => Ok(Json(sessions).into_response()),
        Some("recent") => Ok(Json(Session::by_recency(sessions.into_values())).into_response()),
        Some(other) => Err(AppError::BadRequest(format!(
            "Unknown session order '{other}'"
        ))),
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, AppError> {
    checked_id(&id)?;

    state
        .sessions
        .get_one(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Session '{id}' not found")))
}
