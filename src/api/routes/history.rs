use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::models::HistoryQuery;
use crate::api::AppState;
use crate::models::history::{HistoryRecord, StatusTrend};
use super::parse_stage;

/// Trend window when none is given.
const TREND_WINDOW: usize = 20;

pub async fn get_history(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    let agent = parse_stage(&agent)?;
    let history = state.history.as_ref().ok_or(ApiError::HistoryDisabled)?;
    Ok(Json(history.recent_history(agent.as_str(), query.limit())?))
}

pub async fn get_trend(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<StatusTrend>, ApiError> {
    let agent = parse_stage(&agent)?;
    let history = state.history.as_ref().ok_or(ApiError::HistoryDisabled)?;
    let window = query.limit.map(|_| query.limit()).unwrap_or(TREND_WINDOW);
    Ok(Json(history.status_trend(agent.as_str(), window)?))
}
