use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::checked_id;
use crate::{
    store::{DeleteOutcome, SessionStore},
    AppError, AppState,
};

/// Deletes a session from every backend. Answers 404 with
/// `{ "success": false }` if no backend had it.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DeleteOutcome>), AppError> {
    checked_id(&id)?;

    let outcome = state.sessions.delete(&id).await?;
    if !outcome.success {
        return Ok((StatusCode::NOT_FOUND, Json(outcome)));
    }

    info!(id = %id, "session deleted");
    Ok((StatusCode::OK, Json(outcome)))
}
