use axum::{extract::Multipart, Json};
use serde_json::Value;
use tracing::debug;

use crate::AppError;

/// Parses the first field of a multipart upload as JSON and echoes it back.
/// Nothing is stored.
pub async fn upload_file(mut multipart: Multipart) -> Result<Json<Value>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
        .ok_or_else(|| AppError::BadRequest("No file uploaded".into()))?;

    let file_name = field.file_name().map(str::to_owned);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    debug!(?file_name, size = bytes.len(), "upload received");

    let document = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON file: {e}")))?;

    Ok(Json(document))
}
