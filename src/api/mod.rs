pub mod errors;
pub mod models;
pub mod routes;

use std::path::PathBuf;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::PersistentHistory;
use crate::errors::PipelineError;

/// Read-only view over the report directory and the history store.
#[derive(Clone)]
pub struct AppState {
    pub report_dir: PathBuf,
    pub history: Option<PersistentHistory>,
}

/// Opens the history store if it exists; the feed still serves reports
/// without one.
pub fn create_app_state(report_dir: PathBuf, history_db: Option<PathBuf>) -> Result<AppState, PipelineError> {
    let history = history_db.map(PersistentHistory::new).transpose()?;
    Ok(AppState { report_dir, history })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/reports", get(routes::reports::list_reports))
        .route("/api/reports/:stage", get(routes::reports::get_report))
        .route("/api/history/:agent", get(routes::history::get_history))
        .route("/api/history/:agent/trend", get(routes::history::get_trend))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
