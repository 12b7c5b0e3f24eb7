use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::PipelineError;
use super::provider::{send_json, LLMProvider};
use super::types::{ChatMessage, LLMResponse, MAX_COMPLETION_TOKENS};

pub(crate) const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub(crate) const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
const LOCAL_DEFAULT_MODEL: &str = "qwen2.5-coder:1.5b";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

/// Chat-completions client; also serves local OpenAI-compatible servers.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    label: &'static str,
}

impl OpenAIProvider {
    pub fn new(api_key: &str, model: Option<&str>, timeout: Duration) -> Result<Self, PipelineError> {
        Self::with_base_url(api_key, model.or(Some(OPENAI_DEFAULT_MODEL)), OPENAI_BASE_URL, timeout)
    }

    pub fn with_base_url(
        api_key: &str,
        model: Option<&str>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let label = if base_url.contains("api.openai.com") { "openai" } else { "openai-compatible" };
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.unwrap_or(LOCAL_DEFAULT_MODEL).to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            label,
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<LLMResponse, PipelineError> {
        let messages = system
            .map(ChatMessage::system)
            .into_iter()
            .chain(std::iter::once(ChatMessage::user(prompt)))
            .collect();
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        // Local servers usually run without a key
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let reply: ChatResponse = send_json(self.label, request).await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::LLMApi(format!("No content in {} response", self.label)))?;
        let (input_tokens, output_tokens) = reply
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        debug!(provider = self.label, model = %self.model, input_tokens, output_tokens, "Chat completion");
        Ok(LLMResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        self.label
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
