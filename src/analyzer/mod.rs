//! Best-effort summarization of stage results by a language model.
//!
//! The analyzer only ever adds issues and mitigations. It never decides a
//! stage's status, and every failure on its side degrades to a note.

pub mod parse;
pub mod prompts;
pub mod training;

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::credentials::redact_secret;
use crate::config::AnalyzerConfig;
use crate::errors::{with_retry, BackoffPolicy, PipelineError, RetryPolicy};
use crate::llm::{create_provider, LLMProvider};
use crate::models::history::HistoryRecord;
use crate::utils::truncation::{excerpt, truncate_error};

pub use parse::{extract_findings, parse_response, ParsedResponse};
pub use prompts::{PromptLoader, PromptVariables};
pub use training::{suggest_improvements, TrainingSummary};

/// Characters of an unusable reply kept in the note.
const NOTE_CHARS: usize = 200;

/// Supplementary findings for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzerFindings {
    pub issues: Vec<String>,
    pub mitigations: Vec<String>,
    /// Set when the analyzer could not produce structured findings.
    pub note: Option<String>,
}

impl AnalyzerFindings {
    fn note(text: String) -> Self {
        Self {
            note: Some(text),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.mitigations.is_empty() && self.note.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub evidence_chars: usize,
    pub history_depth: usize,
    pub retry: RetryPolicy,
    pub prompts: PromptLoader,
    /// Scrubbed from notes before they reach a report.
    pub api_key: String,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            evidence_chars: 1000,
            history_depth: 5,
            retry: RetryPolicy {
                max_attempts: 2,
                backoff: BackoffPolicy::Fixed(Duration::from_secs(2)),
                attempt_timeout: Duration::from_secs(60),
            },
            prompts: PromptLoader::default(),
            api_key: String::new(),
        }
    }
}

pub struct Analyzer {
    provider: Option<Box<dyn LLMProvider>>,
    settings: AnalyzerSettings,
    /// Why a configured provider could not be built.
    setup_error: Option<String>,
}

impl Analyzer {
    /// An analyzer that contributes nothing.
    pub fn disabled() -> Self {
        Self {
            provider: None,
            settings: AnalyzerSettings::default(),
            setup_error: None,
        }
    }

    /// A configured analyzer that could not be built. Every run gets the
    /// setup error as its note instead of findings.
    pub fn unavailable(error: &PipelineError, api_key: &str) -> Self {
        let settings = AnalyzerSettings {
            api_key: api_key.to_string(),
            ..Default::default()
        };
        let mut analyzer = Self {
            provider: None,
            settings,
            setup_error: None,
        };
        analyzer.setup_error = Some(analyzer.unavailable_note(error));
        analyzer
    }

    pub fn new(provider: Box<dyn LLMProvider>, settings: AnalyzerSettings) -> Self {
        info!(
            provider = provider.provider_name(),
            model = provider.model_name(),
            "Analyzer enabled"
        );
        Self {
            provider: Some(provider),
            settings,
            setup_error: None,
        }
    }

    /// Disabled when no provider is configured. A configured provider that
    /// cannot be built (unknown name, missing key) is a config error.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, PipelineError> {
        let Some(provider_name) = config.provider.as_deref() else {
            debug!("No analyzer provider configured");
            return Ok(Self::disabled());
        };

        let api_key = config.resolved_api_key();
        let provider = create_provider(
            provider_name,
            &api_key,
            config.model.as_deref(),
            config.base_url.as_deref(),
            config.timeout(),
        )?;

        let settings = AnalyzerSettings {
            evidence_chars: config.evidence_chars,
            history_depth: config.history_depth,
            retry: RetryPolicy {
                max_attempts: config.max_attempts.max(1),
                backoff: BackoffPolicy::Fixed(Duration::from_secs(2)),
                // reqwest enforces the per-request timeout; this bounds the whole call
                attempt_timeout: config.timeout() + Duration::from_secs(5),
            },
            prompts: PromptLoader::new(config.prompts_dir.clone()),
            api_key,
        };
        Ok(Self::new(provider, settings))
    }

    /// Like `from_config`, but a provider that cannot be built only costs the
    /// findings. Stage runs use this; `validate` and `train` stay strict.
    pub fn from_config_lenient(config: &AnalyzerConfig) -> Self {
        Self::from_config(config).unwrap_or_else(|e| {
            warn!(provider = ?config.provider, error = %e, "Analyzer disabled for this run");
            Self::unavailable(&e, &config.resolved_api_key())
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// A provider was configured, whether or not it could be built.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some() || self.setup_error.is_some()
    }

    /// How many past summaries to feed into a prompt.
    pub fn history_depth(&self) -> usize {
        if self.is_enabled() {
            self.settings.history_depth
        } else {
            0
        }
    }

    /// Ask for issues and mitigations beyond what `summary` already lists.
    pub async fn summarize(
        &self,
        agent: &str,
        summary: &Value,
        evidence: &str,
        history: &[HistoryRecord],
    ) -> AnalyzerFindings {
        if self.provider.is_none() {
            return match &self.setup_error {
                Some(note) => AnalyzerFindings::note(note.clone()),
                None => AnalyzerFindings::default(),
            };
        }

        let prompt = match self.render("stage-analysis", agent, Some(summary), Some(evidence), history) {
            Ok(prompt) => prompt,
            Err(e) => return AnalyzerFindings::note(self.unavailable_note(&e)),
        };

        let raw = match self.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(agent, error = %e, "Analyzer call failed");
                return AnalyzerFindings::note(self.unavailable_note(&e));
            }
        };

        match parse_response(&raw) {
            ParsedResponse::Structured(value) => match extract_findings(&value) {
                Some((issues, mitigations)) => {
                    debug!(agent, issues = issues.len(), mitigations = mitigations.len(), "Analyzer findings");
                    AnalyzerFindings {
                        issues,
                        mitigations,
                        note: None,
                    }
                }
                None => AnalyzerFindings::note(self.raw_note(&raw)),
            },
            ParsedResponse::Unstructured(text) => {
                debug!(agent, "Analyzer reply had no usable JSON");
                AnalyzerFindings::note(self.raw_note(&text))
            }
        }
    }

    /// Plain completion through the retry policy. Errors when disabled.
    pub async fn complete(&self, prompt: &str) -> Result<String, PipelineError> {
        let provider = self
            .provider
            .as_deref()
            .ok_or_else(|| PipelineError::Analyzer("No analyzer provider configured".into()))?;

        let response = with_retry("analyzer", &self.settings.retry, || {
            provider.complete(prompt, Some(prompts::SYSTEM_PROMPT))
        })
        .await?;
        Ok(response.content)
    }

    pub(crate) fn render(
        &self,
        template: &str,
        agent: &str,
        summary: Option<&Value>,
        evidence: Option<&str>,
        history: &[HistoryRecord],
    ) -> Result<String, PipelineError> {
        let loader = &self.settings.prompts;
        let template = loader.load(template)?;
        let vars = PromptVariables {
            agent: agent.to_string(),
            summary: summary.map(|s| serde_json::to_string_pretty(s).unwrap_or_else(|_| s.to_string())),
            evidence: evidence.map(|e| excerpt(e, self.settings.evidence_chars).to_string()),
            history: Some(render_history(history, self.settings.history_depth)),
        };
        Ok(loader.interpolate(&template, &vars))
    }

    fn raw_note(&self, raw: &str) -> String {
        let text = excerpt(raw.trim(), NOTE_CHARS);
        let text = if text.is_empty() { "empty response" } else { text };
        format!("Analyzer note: {}", redact_secret(text, &self.settings.api_key))
    }

    fn unavailable_note(&self, error: &PipelineError) -> String {
        format!(
            "Analyzer unavailable: {}",
            redact_secret(&truncate_error(&error.to_string()), &self.settings.api_key)
        )
    }
}

/// One line per record: time, status and issues.
fn render_history(history: &[HistoryRecord], depth: usize) -> String {
    history
        .iter()
        .take(depth)
        .map(|record| {
            let status = record.status().unwrap_or("n/a");
            let issues = record
                .summary
                .get("issues")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("; "))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "no issues".to_string());
            format!("- {} {}: {}", record.timestamp.format("%Y-%m-%d %H:%M:%S"), status, issues)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
