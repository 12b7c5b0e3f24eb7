use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::StagecraftConfig;
use crate::errors::{PipelineError, RetryExecutor};
use crate::fallback::KubectlLogSource;
use super::build::BuildStrategy;
use super::deploy::DeployStrategy;
use super::log_analysis::LogAnalysisStrategy;
use super::strategy::StageStrategy;
use super::test::TestStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AgentName {
    Build,
    Test,
    Deploy,
    LogAnalysis,
}

impl AgentName {
    /// Pipeline order.
    pub const ALL: [AgentName; 4] = [Self::Build, Self::Test, Self::Deploy, Self::LogAnalysis];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Test => "test",
            Self::Deploy => "deploy",
            Self::LogAnalysis => "log-analysis",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Build => "Build agent",
            Self::Test => "Test agent",
            Self::Deploy => "Deploy agent",
            Self::LogAnalysis => "Log analysis agent",
        }
    }

    /// File the dashboard polls for this stage.
    pub fn report_filename(&self) -> &'static str {
        match self {
            Self::Build => "build_report.json",
            Self::Test => "test_report.json",
            Self::Deploy => "deploy_report.json",
            Self::LogAnalysis => "log_analysis_report.json",
        }
    }
}

impl std::fmt::Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentName {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == normalized || normalized == format!("{}-agent", a.as_str()))
            .ok_or_else(|| PipelineError::Config(format!("Unknown stage: {}", s)))
    }
}

/// The production strategy for a stage, wired from config.
///
/// Relative paths (build context, manifest) resolve against `workdir`.
pub fn create_strategy(
    agent: AgentName,
    config: &StagecraftConfig,
    workdir: &Path,
) -> Result<Box<dyn StageStrategy>, PipelineError> {
    Ok(match agent {
        AgentName::Build => Box::new(BuildStrategy::from_config(&config.build, workdir)),
        AgentName::Test => Box::new(TestStrategy::from_config(&config.test)?),
        AgentName::Deploy => Box::new(DeployStrategy::from_config(&config.deploy, workdir)),
        AgentName::LogAnalysis => {
            let fetch_policy = config.retry.policy();
            let source = KubectlLogSource::new(
                &config.log_analysis.selector,
                &config.log_analysis.namespace,
                RetryExecutor::new(fetch_policy.with_max_attempts(config.retry.max_attempts.min(2))),
                config.log_analysis.synthetic.clone(),
            )?;
            Box::new(LogAnalysisStrategy::new(Box::new(source), &config.log_analysis))
        }
    })
}

/// Deadline for a single probe or status query.
pub(crate) fn short_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}
