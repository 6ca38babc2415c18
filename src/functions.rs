pub mod delete_session;
pub mod get_sessions;
pub mod health;
pub mod plot_statistics;
pub mod save_session;
pub mod upload_file;

use crate::{models::session::validate_session_id, AppError};

/// Rejects path ids that could never name a stored session before any
/// backend sees them.
pub(crate) fn checked_id(id: &str) -> Result<(), AppError> {
    validate_session_id(id).map_err(AppError::BadRequest)
}
