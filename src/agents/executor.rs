use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::analyzer::Analyzer;
use crate::db::PersistentHistory;
use crate::errors::{PipelineError, RetryExecutor};
use crate::models::history::HistoryRecord;
use crate::models::report::Report;
use crate::reporting::{write_artifact, write_report, ReportLocation};
use super::registry::AgentName;
use super::strategy::{Preparation, StageContext, StageStrategy};

const GENERIC_MITIGATION: &str = "Inspect the stage logs and rerun the stage";

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    Init,
    Preparing,
    Executing,
    Analyzing,
    Reporting,
    Done,
}

impl StagePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Preparing => "preparing",
            Self::Executing => "executing",
            Self::Analyzing => "analyzing",
            Self::Reporting => "reporting",
            Self::Done => "done",
        }
    }
}

/// Result of one stage invocation.
#[derive(Debug, Clone)]
pub struct StageRun {
    pub report: Report,
    pub location: ReportLocation,
    pub exit_code: i32,
}

/// Drives one strategy through prepare, execute, analyze and report.
///
/// `run` never returns an error: whatever happens inside the stage ends up
/// in the report, and exactly one report is written.
pub struct StageAgent {
    strategy: Box<dyn StageStrategy>,
    analyzer: Arc<Analyzer>,
    executor: RetryExecutor,
    report_dir: PathBuf,
    history: Option<PersistentHistory>,
    phase: StagePhase,
}

impl StageAgent {
    pub fn new(
        strategy: Box<dyn StageStrategy>,
        analyzer: Arc<Analyzer>,
        executor: RetryExecutor,
        report_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            strategy,
            analyzer,
            executor,
            report_dir: report_dir.into(),
            history: None,
            phase: StagePhase::Init,
        }
    }

    pub fn with_history(mut self, history: PersistentHistory) -> Self {
        self.history = Some(history);
        self
    }

    fn enter(&mut self, phase: StagePhase) {
        debug!(
            agent = %self.strategy.agent(),
            from = self.phase.as_str(),
            to = phase.as_str(),
            "Stage phase transition"
        );
        self.phase = phase;
    }

    pub async fn run(mut self) -> StageRun {
        let agent = self.strategy.agent();
        let start = Instant::now();
        info!(agent = %agent, "Starting stage");

        let mut ctx = StageContext::new(agent, self.executor.clone(), self.report_dir.clone());

        self.enter(StagePhase::Preparing);
        let ready = match self.strategy.prepare(&mut ctx).await {
            Ok(Preparation::Ready) => true,
            Ok(Preparation::Blocked) => {
                warn!(agent = %agent, "Precondition failed, skipping execution");
                false
            }
            Err(e) => {
                record_stage_error(&mut ctx.report, "preparation", &e);
                false
            }
        };

        if ready {
            self.enter(StagePhase::Executing);
            if let Err(e) = self.strategy.execute(&mut ctx).await {
                record_stage_error(&mut ctx.report, "execution", &e);
            }
        }

        self.enter(StagePhase::Analyzing);
        self.analyze(&mut ctx).await;

        self.enter(StagePhase::Reporting);
        let mut report = ctx.report;
        report.duration_ms = start.elapsed().as_millis() as u64;
        let location = write_report(&mut report, &self.report_dir, agent.report_filename()).await;

        for (file_name, content) in self.strategy.artifacts(&report) {
            if let Err(e) = write_artifact(&self.report_dir, &file_name, &content).await {
                warn!(agent = %agent, file = %file_name, error = %e, "Failed to write artifact");
            }
        }

        if let Some(history) = &self.history {
            match serde_json::to_value(&report) {
                Ok(summary) => {
                    if let Err(e) = history.append_history(agent.as_str(), &summary) {
                        warn!(agent = %agent, error = %e, "Failed to append history");
                    }
                }
                Err(e) => warn!(agent = %agent, error = %e, "Report not serializable for history"),
            }
        }

        self.enter(StagePhase::Done);
        let exit_code = report.exit_code();
        info!(
            agent = %agent,
            status = %report.status,
            issues = report.issues.len(),
            duration_ms = report.duration_ms,
            "Stage finished"
        );
        StageRun {
            report,
            location,
            exit_code,
        }
    }

    async fn analyze(&self, ctx: &mut StageContext) {
        if !self.analyzer.is_configured() {
            return;
        }
        let agent = ctx.agent;

        let history = self.load_history(agent.as_str());
        let summary = match serde_json::to_value(&ctx.report) {
            Ok(v) => v,
            Err(e) => {
                warn!(agent = %agent, error = %e, "Report not serializable for analysis");
                Value::Null
            }
        };
        let evidence = self.strategy.evidence(ctx);

        let findings = self.analyzer.summarize(agent.as_str(), &summary, &evidence, &history).await;
        let added = ctx.report.merge_findings(&findings.issues, &findings.mitigations);
        if let Some(note) = findings.note {
            ctx.report.add_mitigation(note);
        }
        debug!(agent = %agent, added, "Analyzer findings merged");
    }

    fn load_history(&self, agent: &str) -> Vec<HistoryRecord> {
        let depth = self.analyzer.history_depth();
        let Some(history) = self.history.as_ref().filter(|_| depth > 0) else {
            return Vec::new();
        };
        history.recent_history(agent, depth).unwrap_or_else(|e| {
            warn!(agent, error = %e, "History unavailable for analysis");
            Vec::new()
        })
    }
}

/// Report for a stage whose strategy could not even be built, so the
/// dashboard still sees a verdict for it.
pub async fn setup_failure(agent: AgentName, error: &PipelineError, report_dir: &Path) -> StageRun {
    let mut report = Report::new(agent.as_str());
    record_stage_error(&mut report, "setup", error);
    let location = write_report(&mut report, report_dir, agent.report_filename()).await;
    StageRun {
        exit_code: report.exit_code(),
        report,
        location,
    }
}

fn record_stage_error(report: &mut Report, step: &str, e: &PipelineError) {
    error!(agent = %report.agent, step, error = %e, "Stage errored");
    report.fail(format!("Stage {} error: {}", step, e), GENERIC_MITIGATION);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::testing::scripted;
    use crate::models::report::ReportStatus;
    use async_trait::async_trait;

    struct Erroring;

    #[async_trait]
    impl StageStrategy for Erroring {
        fn agent(&self) -> AgentName {
            AgentName::Build
        }

        async fn prepare(&mut self, _ctx: &mut StageContext) -> Result<Preparation, PipelineError> {
            Ok(Preparation::Ready)
        }

        async fn execute(&mut self, _ctx: &mut StageContext) -> Result<(), PipelineError> {
            Err(PipelineError::Internal("boom".into()))
        }
    }

    struct Silent;

    #[async_trait]
    impl StageStrategy for Silent {
        fn agent(&self) -> AgentName {
            AgentName::Test
        }

        async fn prepare(&mut self, _ctx: &mut StageContext) -> Result<Preparation, PipelineError> {
            Ok(Preparation::Ready)
        }

        async fn execute(&mut self, _ctx: &mut StageContext) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_strategy_error_becomes_failed_report() {
        let dir = tempfile::tempdir().unwrap();
        let run = StageAgent::new(
            Box::new(Erroring),
            Arc::new(Analyzer::disabled()),
            RetryExecutor::default(),
            dir.path(),
        )
        .run()
        .await;

        assert_eq!(run.report.status, ReportStatus::Failed);
        assert!(run.report.has_issue("boom"));
        assert!(run.report.mitigations.contains(&GENERIC_MITIGATION.to_string()));
        assert_eq!(run.exit_code, 1);
        assert!(dir.path().join("build_report.json").exists());
    }

    #[tokio::test]
    async fn test_undecided_stage_is_never_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let run = StageAgent::new(
            Box::new(Silent),
            Arc::new(Analyzer::disabled()),
            RetryExecutor::default(),
            dir.path(),
        )
        .run()
        .await;
        assert_eq!(run.report.status, ReportStatus::Failed);
    }

    #[tokio::test]
    async fn test_setup_failure_still_writes_a_report() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineError::Config("bad endpoint".into());
        let run = setup_failure(AgentName::Test, &err, dir.path()).await;
        assert_eq!(run.report.status, ReportStatus::Failed);
        assert_eq!(run.location, ReportLocation::Primary(dir.path().join("test_report.json")));
    }

    #[tokio::test]
    async fn test_history_is_appended_and_fed_back() {
        let dir = tempfile::tempdir().unwrap();
        let history = PersistentHistory::in_memory().unwrap();

        for _ in 0..2 {
            StageAgent::new(
                Box::new(Erroring),
                Arc::new(scripted(vec![Ok(r#"{"issues": [], "mitigations": ["Pin the base image"]}"#)])),
                RetryExecutor::default(),
                dir.path(),
            )
            .with_history(history.clone())
            .run()
            .await;
        }

        let records = history.recent_history("build", 10).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].timestamp > records[1].timestamp);
        let mitigations = records[0].summary["mitigations"].as_array().unwrap();
        assert!(mitigations.iter().any(|m| m == "Pin the base image"));
    }
}
