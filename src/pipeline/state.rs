use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agents::{AgentName, StageRun};
use crate::models::report::ReportStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Completed,
    Failed,
}

/// One stage's line in the pipeline summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub agent: AgentName,
    pub status: ReportStatus,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub issues: usize,
    /// `None` when the report only made it to the console.
    pub report_path: Option<PathBuf>,
}

impl StageResult {
    pub fn from_run(agent: AgentName, run: &StageRun) -> Self {
        Self {
            agent,
            status: run.report.status,
            exit_code: run.exit_code,
            duration_ms: run.report.duration_ms,
            issues: run.report.issues.len(),
            report_path: run.location.path().map(|p| p.to_path_buf()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub status: PipelineStatus,
    pub stages: Vec<StageResult>,
    /// Stages never started because an earlier one failed.
    pub not_run: Vec<AgentName>,
    pub total_duration_ms: u64,
}

impl PipelineSummary {
    pub fn compute(stages: Vec<StageResult>, not_run: Vec<AgentName>) -> Self {
        let failed = stages.iter().any(|s| s.exit_code != 0);
        Self {
            status: if failed { PipelineStatus::Failed } else { PipelineStatus::Completed },
            total_duration_ms: stages.iter().map(|s| s.duration_ms).sum(),
            stages,
            not_run,
        }
    }

    /// 1 if any stage failed.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            PipelineStatus::Completed => 0,
            PipelineStatus::Failed => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(agent: AgentName, status: ReportStatus, duration_ms: u64) -> StageResult {
        StageResult {
            agent,
            status,
            exit_code: status.exit_code(),
            duration_ms,
            issues: 0,
            report_path: None,
        }
    }

    #[test]
    fn test_skipped_stages_do_not_fail_the_pipeline() {
        let summary = PipelineSummary::compute(
            vec![
                result(AgentName::Build, ReportStatus::Success, 100),
                result(AgentName::Test, ReportStatus::Skipped, 20),
            ],
            Vec::new(),
        );
        assert_eq!(summary.status, PipelineStatus::Completed);
        assert_eq!(summary.total_duration_ms, 120);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_any_failure_fails_the_pipeline() {
        let summary = PipelineSummary::compute(
            vec![result(AgentName::Build, ReportStatus::Failed, 5)],
            vec![AgentName::Test, AgentName::Deploy, AgentName::LogAnalysis],
        );
        assert_eq!(summary.status, PipelineStatus::Failed);
        assert_eq!(summary.exit_code(), 1);
    }
}
