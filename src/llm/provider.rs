use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::errors::PipelineError;
use super::types::{ErrorEnvelope, LLMResponse};

/// Text in, text out. Anything structured is the caller's business.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<LLMResponse, PipelineError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;
}

/// Send a JSON request and decode the reply, mapping transport and HTTP
/// failures into the error taxonomy.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
) -> Result<T, PipelineError> {
    let resp = request.send().await.map_err(|e| {
        if e.is_timeout() {
            PipelineError::Timeout(format!("{} request timed out: {}", provider, e))
        } else {
            PipelineError::Network(format!("{} request failed: {}", provider, e))
        }
    })?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| PipelineError::Network(format!("{} response body unreadable: {}", provider, e)))?;

    if !status.is_success() {
        let detail = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .ok()
            .filter(|message| !message.is_empty());
        return Err(status_error(provider, status, detail));
    }

    serde_json::from_str(&body)
        .map_err(|e| PipelineError::LLMApi(format!("Failed to parse {} response: {}", provider, e)))
}

fn status_error(provider: &str, status: StatusCode, detail: Option<String>) -> PipelineError {
    match status.as_u16() {
        429 => PipelineError::RateLimit(format!("{} rate limit exceeded", provider)),
        401 | 403 => PipelineError::Authentication(format!("{} rejected the API key", provider)),
        code => match detail {
            Some(message) => PipelineError::LLMApi(format!("{} returned HTTP {}: {}", provider, code, message)),
            None => PipelineError::LLMApi(format!("{} returned HTTP {}", provider, code)),
        },
    }
}
