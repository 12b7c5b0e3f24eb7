use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::errors::PipelineError;
use super::action::{ActionOutput, ExternalAction};

/// GETs an endpoint; any 2xx response counts as success.
pub struct HttpProbe {
    client: Client,
    url: String,
    label: String,
}

impl HttpProbe {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.to_string(),
            label: format!("GET {}", url),
        })
    }
}

#[async_trait]
impl ExternalAction for HttpProbe {
    fn name(&self) -> &str {
        &self.label
    }

    async fn run(&self) -> Result<ActionOutput, PipelineError> {
        let resp = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                PipelineError::Timeout(format!("{} timed out: {}", self.url, e))
            } else {
                PipelineError::Network(format!("{} unreachable: {}", self.url, e))
            }
        })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PipelineError::Network(format!("Failed to read response body: {}", e)))?;

        Ok(ActionOutput {
            success: status.is_success(),
            exit_code: Some(i32::from(status.as_u16())),
            stdout: body,
            stderr: if status.is_success() {
                String::new()
            } else {
                format!("HTTP {}", status)
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        // Port 9 (discard) is essentially never listening on loopback.
        let probe = HttpProbe::new("http://127.0.0.1:9/health", Duration::from_secs(2)).unwrap();
        let err = probe.run().await.unwrap_err();
        assert!(err.classify().retryable);
        assert!(matches!(err, PipelineError::Network(_) | PipelineError::Timeout(_)));
    }
}
