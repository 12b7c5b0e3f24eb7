use tracing::info;

use crate::api;
use crate::errors::PipelineError;
use super::commands::ServeArgs;
use super::context::Overrides;

pub async fn handle_serve(overrides: &Overrides, args: ServeArgs) -> Result<i32, PipelineError> {
    let config = overrides.load().await?;
    // Read-only: never create a history store that no stage has written
    let history_db = Some(config.output.history_db.clone()).filter(|p| p.exists());
    if history_db.is_none() {
        info!(path = %config.output.history_db.display(), "No history store yet, serving reports only");
    }

    let state = api::create_app_state(config.output.report_dir.clone(), history_db)?;
    let app = api::build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(report_dir = %config.output.report_dir.display(), "Dashboard feed listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| PipelineError::Internal(format!("Server error: {}", e)))?;

    Ok(0)
}
