use std::time::Duration;

use crate::errors::PipelineError;
use super::provider::LLMProvider;
use super::anthropic::AnthropicProvider;
use super::openai::{OpenAIProvider, OPENAI_DEFAULT_MODEL};

const LOCAL_BASE_URL: &str = "http://localhost:11434/v1";

/// Build a provider by name: `anthropic`, `openai`, `local`/`ollama`, or
/// `openai-compatible` (requires `base_url`).
pub fn create_provider(
    provider_name: &str,
    api_key: &str,
    model: Option<&str>,
    base_url: Option<&str>,
    timeout: Duration,
) -> Result<Box<dyn LLMProvider>, PipelineError> {
    match provider_name.to_ascii_lowercase().as_str() {
        "anthropic" | "claude" => {
            require_key(provider_name, api_key)?;
            let provider = AnthropicProvider::new(api_key, model, timeout)?;
            Ok(Box::new(match base_url {
                Some(url) => provider.with_base_url(url),
                None => provider,
            }))
        }
        "openai" => {
            require_key(provider_name, api_key)?;
            match base_url {
                Some(url) => Ok(Box::new(OpenAIProvider::with_base_url(
                    api_key,
                    model.or(Some(OPENAI_DEFAULT_MODEL)),
                    url,
                    timeout,
                )?)),
                None => Ok(Box::new(OpenAIProvider::new(api_key, model, timeout)?)),
            }
        }
        "local" | "ollama" => Ok(Box::new(OpenAIProvider::with_base_url(
            api_key,
            model,
            base_url.unwrap_or(LOCAL_BASE_URL),
            timeout,
        )?)),
        "openai-compatible" | "openai_compatible" => {
            let url = base_url.ok_or_else(|| {
                PipelineError::Config("openai-compatible provider requires analyzer.base_url".into())
            })?;
            Ok(Box::new(OpenAIProvider::with_base_url(api_key, model, url, timeout)?))
        }
        _ => Err(PipelineError::Config(format!("Unknown LLM provider: {}", provider_name))),
    }
}

fn require_key(provider_name: &str, api_key: &str) -> Result<(), PipelineError> {
    if api_key.trim().is_empty() {
        return Err(PipelineError::Config(format!(
            "No API key for provider '{}'; set it in the config or the environment",
            provider_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_providers() {
        let t = Duration::from_secs(5);
        let p = create_provider("anthropic", "sk-test", None, None, t).unwrap();
        assert_eq!(p.provider_name(), "anthropic");
        let p = create_provider("local", "", Some("llama3"), None, t).unwrap();
        assert_eq!(p.provider_name(), "openai-compatible");
        assert_eq!(p.model_name(), "llama3");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = create_provider("openai", " ", None, None, Duration::from_secs(5)).err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_unknown_provider() {
        assert!(create_provider("gpt2", "", None, None, Duration::from_secs(5)).is_err());
    }
}
