use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{BackoffPolicy, RetryPolicy};
use crate::fallback::SyntheticLogPolicy;
use super::credentials::resolve_credential;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StagecraftConfig {
    pub output: OutputConfig,
    pub retry: RetryConfig,
    pub analyzer: AnalyzerConfig,
    pub build: BuildConfig,
    pub test: TestConfig,
    pub deploy: DeployConfig,
    pub log_analysis: LogAnalysisConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_dir: PathBuf,
    pub history_db: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("."),
            history_db: PathBuf::from("agent_history.db"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

impl BackoffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Exponential => "exponential",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff: BackoffKind,
    /// Fixed delay, or the base of the exponential schedule.
    pub delay_secs: f64,
    pub max_delay_secs: f64,
    pub attempt_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffKind::Fixed,
            delay_secs: 5.0,
            max_delay_secs: 60.0,
            attempt_timeout_secs: 300,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        let delay = secs(self.delay_secs);
        let backoff = match self.backoff {
            BackoffKind::Fixed => BackoffPolicy::Fixed(delay),
            BackoffKind::Exponential => BackoffPolicy::Exponential {
                base: delay,
                max: secs(self.max_delay_secs),
            },
        };
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff,
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// `anthropic`, `openai`, `local` or `openai-compatible`; unset disables
    /// the analyzer.
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Literal key or `$ENV_VAR` reference.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub evidence_chars: usize,
    pub history_depth: usize,
    /// Directory of `<name>.txt` templates overriding the built-in prompts.
    pub prompts_dir: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            api_key: None,
            base_url: None,
            timeout_secs: 60,
            max_attempts: 2,
            evidence_chars: 1000,
            history_depth: 5,
            prompts_dir: None,
        }
    }
}

impl AnalyzerConfig {
    /// Configured key, else the provider's conventional environment variable.
    pub fn resolved_api_key(&self) -> String {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            return resolve_credential(key);
        }
        let var = match self.provider.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("anthropic") | Some("claude") => "ANTHROPIC_API_KEY",
            Some("openai") | Some("openai-compatible") | Some("openai_compatible") => "OPENAI_API_KEY",
            _ => return String::new(),
        };
        std::env::var(var).unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildConfig {
    pub registry: String,
    /// Registry namespace; falls back to `GITHUB_ACTOR`.
    pub actor: Option<String>,
    pub image_name: String,
    pub tag: String,
    pub context: PathBuf,
    pub push: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            registry: "ghcr.io".to_string(),
            actor: None,
            image_name: "myimage".to_string(),
            tag: "latest".to_string(),
            context: PathBuf::from("."),
            push: true,
        }
    }
}

impl BuildConfig {
    pub fn resolved_actor(&self) -> String {
        self.actor
            .clone()
            .filter(|a| !a.is_empty())
            .or_else(|| std::env::var("GITHUB_ACTOR").ok().filter(|a| !a.is_empty()))
            .unwrap_or_else(|| "your-username".to_string())
    }

    /// `<registry>/<actor>/<image_name>:<tag>`
    pub fn image_ref(&self) -> String {
        format!(
            "{}/{}/{}:{}",
            self.registry.trim_end_matches('/'),
            self.resolved_actor(),
            self.image_name,
            self.tag
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TestConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Overrides `retry.max_attempts` for the probe.
    pub max_attempts: Option<u32>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/health".to_string(),
            timeout_secs: 5,
            max_attempts: Some(1),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployConfig {
    pub manifest: PathBuf,
    pub deployment_name: String,
    pub namespace: String,
    pub pod_selector: String,
    /// Create the cluster before applying; off when one already exists.
    pub provision: bool,
    pub cluster_name: String,
    pub provision_attempts: u32,
    pub provision_delay_secs: f64,
}

impl DeployConfig {
    pub fn provision_delay(&self) -> Duration {
        secs(self.provision_delay_secs)
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("deployment.yaml"),
            deployment_name: "microservice".to_string(),
            namespace: "default".to_string(),
            pod_selector: "app=microservice".to_string(),
            provision: true,
            cluster_name: "kind".to_string(),
            provision_attempts: 3,
            provision_delay_secs: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogAnalysisConfig {
    pub namespace: String,
    pub selector: String,
    /// Percent of error records above which the run is flagged.
    pub error_rate_threshold: f64,
    /// Skip the cluster and analyze synthetic logs directly.
    pub synthetic_only: bool,
    pub synthetic: SyntheticLogPolicy,
    pub markdown_report: bool,
}

impl Default for LogAnalysisConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            selector: "app=microservice".to_string(),
            error_rate_threshold: 5.0,
            synthetic_only: false,
            synthetic: SyntheticLogPolicy::default(),
            markdown_report: true,
        }
    }
}

/// Negative and NaN mean no delay; out-of-range values saturate.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}
