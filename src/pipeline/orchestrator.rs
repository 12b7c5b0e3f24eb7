use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::agents::{create_strategy, setup_failure, AgentName, StageAgent, StageRun, StageStrategy};
use crate::analyzer::Analyzer;
use crate::config::StagecraftConfig;
use crate::db::PersistentHistory;
use crate::errors::{PipelineError, RetryExecutor};
use super::phase::{stage_definition, STAGES};
use super::state::{PipelineSummary, StageResult};

/// Builds the strategy for a stage; the default wires the real tools.
pub type StrategyFactory = Box<dyn Fn(AgentName) -> Result<Box<dyn StageStrategy>, PipelineError> + Send + Sync>;

/// Runs stages one at a time against a shared config, analyzer and history.
pub struct PipelineOrchestrator {
    config: Arc<StagecraftConfig>,
    analyzer: Arc<Analyzer>,
    history: Option<PersistentHistory>,
    factory: StrategyFactory,
    keep_going: bool,
}

impl PipelineOrchestrator {
    /// Relative paths in `config` resolve against `workdir`.
    pub fn new(config: Arc<StagecraftConfig>, analyzer: Arc<Analyzer>, workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        let factory_config = config.clone();
        Self {
            config,
            analyzer,
            history: None,
            factory: Box::new(move |agent| create_strategy(agent, &factory_config, &workdir)),
            keep_going: false,
        }
    }

    pub fn with_history(mut self, history: PersistentHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Swap in a different strategy source, e.g. scripted tools.
    pub fn with_strategy_factory(mut self, factory: StrategyFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Continue past a failed stage instead of stopping.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    fn report_dir(&self) -> PathBuf {
        self.config.output.report_dir.clone()
    }

    /// Run a single stage. Always yields a written report.
    pub async fn run_stage(&self, agent: AgentName) -> StageRun {
        let strategy = match (self.factory)(agent) {
            Ok(strategy) => strategy,
            Err(e) => {
                warn!(agent = %agent, error = %e, "Could not set up stage");
                return setup_failure(agent, &e, &self.report_dir()).await;
            }
        };

        let executor = RetryExecutor::new(self.config.retry.policy());
        let mut stage = StageAgent::new(strategy, self.analyzer.clone(), executor, self.report_dir());
        if let Some(history) = &self.history {
            stage = stage.with_history(history.clone());
        }
        stage.run().await
    }

    /// Run every stage in order.
    pub async fn run(&self) -> PipelineSummary {
        let mut results = Vec::with_capacity(STAGES.len());
        let mut not_run = Vec::new();
        let mut stopped = false;

        for (index, stage) in STAGES.iter().enumerate() {
            if stopped {
                not_run.push(stage.agent);
                continue;
            }

            info!(
                stage = stage.display_name,
                step = index + 1,
                total = STAGES.len(),
                "{}",
                stage.description
            );
            let run = self.run_stage(stage.agent).await;
            let result = StageResult::from_run(stage.agent, &run);

            if result.exit_code != 0 && !self.keep_going {
                warn!(stage = stage.display_name, "Stage failed, stopping the pipeline");
                stopped = true;
            }
            results.push(result);
        }

        let summary = PipelineSummary::compute(results, not_run);
        info!(
            status = ?summary.status,
            stages = summary.stages.len(),
            skipped_stages = summary.not_run.len(),
            duration_ms = summary.total_duration_ms,
            "Pipeline finished"
        );
        summary
    }
}

pub fn display_name(agent: AgentName) -> &'static str {
    stage_definition(agent).map(|s| s.display_name).unwrap_or_else(|| agent.display_name())
}
