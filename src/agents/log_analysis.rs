use async_trait::async_trait;
use tracing::info;

use crate::config::LogAnalysisConfig;
use crate::errors::PipelineError;
use crate::fallback::{fetch_or_synthesize, DataOrigin, FallbackDataSource, Sourced};
use crate::models::log_record::LogRecord;
use crate::models::report::{Report, ReportStatus};
use crate::reporting::format_report_markdown;
use super::registry::AgentName;
use super::stats::LogStats;
use super::strategy::{Preparation, StageContext, StageStrategy};

/// Log lines handed to the analyzer as evidence.
const EVIDENCE_LINES: usize = 200;

const ERROR_RATE_MITIGATION: &str =
    "Investigate the failing requests and roll back recent changes if errors persist";
const AUTH_MITIGATION: &str = "Review authentication configuration and rotate exposed credentials";

pub type LogSource = Box<dyn FallbackDataSource<Data = Vec<LogRecord>>>;

/// Summarizes service logs, real or synthetic.
///
/// Flagged anomalies become issues; the stage itself still succeeds.
pub struct LogAnalysisStrategy {
    source: LogSource,
    error_rate_threshold: f64,
    synthetic_only: bool,
    markdown_report: bool,
    records: Vec<LogRecord>,
}

impl LogAnalysisStrategy {
    pub fn new(source: LogSource, config: &LogAnalysisConfig) -> Self {
        Self {
            source,
            error_rate_threshold: config.error_rate_threshold,
            synthetic_only: config.synthetic_only,
            markdown_report: config.markdown_report,
            records: Vec::new(),
        }
    }
}

#[async_trait]
impl StageStrategy for LogAnalysisStrategy {
    fn agent(&self) -> AgentName {
        AgentName::LogAnalysis
    }

    async fn prepare(&mut self, ctx: &mut StageContext) -> Result<Preparation, PipelineError> {
        let sourced = if self.synthetic_only {
            Sourced {
                data: self.source.generate_synthetic(),
                origin: DataOrigin::Synthetic,
                fallback_reason: Some("synthetic_only is set".to_string()),
            }
        } else {
            fetch_or_synthesize(self.source.as_ref()).await
        };

        info!(
            records = sourced.data.len(),
            origin = sourced.origin.as_str(),
            "Log records gathered"
        );
        ctx.report.set_field("data_source", sourced.origin.as_str());
        if let Some(reason) = &sourced.fallback_reason {
            ctx.report.set_field("fallback_reason", reason);
        }

        let sample = sourced
            .data
            .iter()
            .take(EVIDENCE_LINES)
            .map(LogRecord::to_line)
            .collect::<Vec<_>>()
            .join("\n");
        ctx.record_evidence(&format!("{} logs", sourced.origin.as_str()), &sample);

        self.records = sourced.data;
        Ok(Preparation::Ready)
    }

    async fn execute(&mut self, ctx: &mut StageContext) -> Result<(), PipelineError> {
        let stats = LogStats::compute(&self.records);
        info!(
            total = stats.total_requests,
            error_rate = stats.error_rate,
            auth_failures = stats.auth_failures,
            "Log statistics computed"
        );

        let report = &mut ctx.report;
        report.set_field("total_requests", stats.total_requests);
        report.set_field("error_count", stats.error_count);
        report.set_field("warning_count", stats.warning_count);
        report.set_field("error_rate", stats.error_rate);
        report.set_field("success_rate", stats.success_rate);
        report.set_field("avg_response_time", stats.avg_response_time);
        report.set_field("auth_failures", stats.auth_failures);

        if stats.exceeds_error_rate(self.error_rate_threshold) {
            report.add_issue(format!(
                "high error rate: {} of {} requests failed ({:.2}%, threshold {}%)",
                stats.error_count, stats.total_requests, stats.error_rate, self.error_rate_threshold
            ));
            report.add_mitigation(ERROR_RATE_MITIGATION);
        }
        if stats.auth_failures > 0 {
            report.add_issue(format!(
                "authentication failures detected: {} login failure(s)",
                stats.auth_failures
            ));
            report.add_mitigation(AUTH_MITIGATION);
        }

        report.set_status(ReportStatus::Success);
        Ok(())
    }

    fn artifacts(&self, report: &Report) -> Vec<(String, String)> {
        if !self.markdown_report {
            return Vec::new();
        }
        vec![("log_analysis_report.md".to_string(), format_report_markdown(report))]
    }
}
