use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{Map, Value};
use tracing::warn;

use crate::agents::AgentName;
use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::models::report::Report;
use crate::reporting::read_report;
use super::parse_stage;

/// Latest report of every stage, keyed by stage name. Stages that never ran
/// (or whose report is unreadable) are left out.
pub async fn list_reports(State(state): State<AppState>) -> Json<Value> {
    let mut reports = Map::new();
    for agent in AgentName::ALL {
        match read_report(&state.report_dir, agent.report_filename()).await {
            Ok(Some(report)) => match serde_json::to_value(&report) {
                Ok(value) => {
                    reports.insert(agent.as_str().to_string(), value);
                }
                Err(e) => warn!(stage = %agent, error = %e, "Report not serializable"),
            },
            Ok(None) => {}
            Err(e) => warn!(stage = %agent, error = %e, "Skipping unreadable report"),
        }
    }
    Json(Value::Object(reports))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(stage): Path<String>,
) -> Result<Json<Report>, ApiError> {
    let agent = parse_stage(&stage)?;
    read_report(&state.report_dir, agent.report_filename())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No report for stage {}", agent)))
}
