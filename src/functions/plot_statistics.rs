use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::checked_id;
use crate::{
    compare::{self, MetricComparison},
    models::PlotType,
    store::SessionStore,
    AppError, AppState,
};

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlotStatistics {
    pub session_id: String,
    pub plot_id: i64,
    pub plot_type: PlotType,
    pub metrics: Vec<MetricComparison>,
}

/// Compares the runs selected by one of a session's custom plots.
pub async fn plot_statistics(
    State(state): State<AppState>,
    Path((id, plot_id)): Path<(String, i64)>,
) -> Result<Json<PlotStatistics>, AppError> {
    checked_id(&id)?;

    let session = state
        .sessions
        .get_one(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session '{id}' not found")))?;
    let plot = session.custom_plot(plot_id).ok_or_else(|| {
        AppError::NotFound(format!("Plot {plot_id} not found in session '{id}'"))
    })?;

    Ok(Json(PlotStatistics {
        session_id: session.id.clone(),
        plot_id,
        plot_type: plot.plot_type,
        metrics: compare::plot_statistics(&session, plot),
    }))
}
