use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;
use tracing::info;

use crate::{
    models::{SaveSessionModel, Session},
    store::SessionStore,
    AppError, AppState,
};

/// Upserts a whole session. The body is parsed by hand so that malformed
/// JSON is reported in the usual `{ "error": .. }` shape.
#[axum::debug_handler]
pub async fn save_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Session>, AppError> {
    let model: SaveSessionModel = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid session body: {e}")))?;
    let session = model
        .into_session(Utc::now())
        .map_err(AppError::BadRequest)?;

    let saved = state.sessions.save(&session).await?;
    info!(id = %saved.id, runs = saved.runs.len(), "session saved");

    Ok(Json(saved))
}
