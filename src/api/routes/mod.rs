pub mod health;
pub mod history;
pub mod reports;

use crate::agents::AgentName;
use super::errors::ApiError;

/// Path segment to stage name; unknown stages are a 404.
pub(crate) fn parse_stage(raw: &str) -> Result<AgentName, ApiError> {
    raw.parse::<AgentName>()
        .map_err(|_| ApiError::NotFound(format!("Unknown stage: {}", raw)))
}
