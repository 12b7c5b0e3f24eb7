use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::errors::PipelineError;

/// Failure of a dashboard request.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    /// The history store was not opened for this server.
    HistoryDisabled,
    Pipeline(PipelineError),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::HistoryDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "History store is not configured".to_string(),
            ),
            ApiError::Pipeline(e) => {
                let status = match &e {
                    PipelineError::Config(_) => StatusCode::BAD_REQUEST,
                    PipelineError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
        };

        (status, Json(json!({"error": message}))).into_response()
    }
}
