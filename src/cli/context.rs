use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::analyzer::Analyzer;
use crate::config::{load_config, StagecraftConfig};
use crate::db::PersistentHistory;
use crate::errors::PipelineError;
use crate::pipeline::PipelineOrchestrator;
use super::commands::Cli;

/// Global flags layered over the config file.
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub history_db: Option<PathBuf>,
}

impl Overrides {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            report_dir: cli.report_dir.clone(),
            history_db: cli.history_db.clone(),
        }
    }

    /// Config file (or defaults) with CLI flags applied on top.
    pub async fn load(&self) -> Result<StagecraftConfig, PipelineError> {
        let mut config = load_config(self.config.as_deref()).await?;
        if let Some(dir) = &self.report_dir {
            config.output.report_dir = dir.clone();
        }
        if let Some(db) = &self.history_db {
            config.output.history_db = db.clone();
        }
        Ok(config)
    }
}

pub fn open_history(config: &StagecraftConfig) -> Result<PersistentHistory, PipelineError> {
    PersistentHistory::new(&config.output.history_db)
}

/// Stage runs keep going without history; it only feeds analysis and trends.
pub fn open_history_lenient(config: &StagecraftConfig) -> Option<PersistentHistory> {
    open_history(config)
        .map_err(|e| warn!(path = %config.output.history_db.display(), error = %e, "History store unavailable"))
        .ok()
}

pub fn orchestrator(config: StagecraftConfig) -> Result<PipelineOrchestrator, PipelineError> {
    let analyzer = Arc::new(Analyzer::from_config_lenient(&config.analyzer));
    let history = open_history_lenient(&config);
    let workdir = std::env::current_dir()?;

    let mut orchestrator = PipelineOrchestrator::new(Arc::new(config), analyzer, workdir);
    if let Some(history) = history {
        orchestrator = orchestrator.with_history(history);
    }
    Ok(orchestrator)
}
