use console::style;

use crate::agents::StageRun;
use crate::models::history::{HistoryRecord, StatusTrend};
use crate::models::report::ReportStatus;
use crate::pipeline::orchestrator::display_name;
use crate::pipeline::{PipelineStatus, PipelineSummary, StageResult};
use crate::reporting::ReportLocation;
use crate::utils::formatting::format_duration;

fn status_badge(status: ReportStatus) -> String {
    match status {
        ReportStatus::Success => style("SUCCESS").green().bold().to_string(),
        ReportStatus::Skipped => style("SKIPPED").yellow().bold().to_string(),
        ReportStatus::Failed => style("FAILED").red().bold().to_string(),
        ReportStatus::Unknown => style("UNKNOWN").dim().to_string(),
    }
}

fn status_mark(status: ReportStatus) -> String {
    match status {
        ReportStatus::Success => style("✓").green().to_string(),
        ReportStatus::Skipped => style("-").yellow().to_string(),
        _ => style("✗").red().to_string(),
    }
}

pub fn render_stage_run(run: &StageRun) -> String {
    let report = &run.report;
    let mut out = format!(
        "{} {} ({})\n",
        status_badge(report.status),
        style(&report.agent).cyan().bold(),
        format_duration(report.duration_ms),
    );
    for issue in &report.issues {
        out.push_str(&format!("  {} {}\n", style("!").red(), issue));
    }
    for mitigation in &report.mitigations {
        out.push_str(&format!("  {} {}\n", style("→").cyan(), mitigation));
    }
    let location = match &run.location {
        ReportLocation::Primary(path) => format!("Report: {}", path.display()),
        ReportLocation::Fallback(path) => format!("Report (fallback location): {}", path.display()),
        ReportLocation::Console => "Report printed to stdout".to_string(),
    };
    out.push_str(&format!("  {}\n", style(location).dim()));
    out
}

fn render_stage_line(result: &StageResult) -> String {
    format!(
        "  {} {:<14} {:<8} {} issue(s), {}",
        status_mark(result.status),
        display_name(result.agent),
        result.status.as_str(),
        result.issues,
        format_duration(result.duration_ms),
    )
}

pub fn render_pipeline_summary(summary: &PipelineSummary) -> String {
    let headline = match summary.status {
        PipelineStatus::Completed => style("Pipeline completed").green().bold(),
        PipelineStatus::Failed => style("Pipeline failed").red().bold(),
    };
    let mut out = format!("\n{} in {}\n", headline, format_duration(summary.total_duration_ms));
    for result in &summary.stages {
        out.push_str(&render_stage_line(result));
        out.push('\n');
    }
    for agent in &summary.not_run {
        out.push_str(&format!("  {} {:<14} not run\n", style("·").dim(), display_name(*agent)));
    }
    out
}

pub fn render_history(records: &[HistoryRecord]) -> String {
    if records.is_empty() {
        return style("No history recorded yet.").dim().to_string();
    }
    records
        .iter()
        .map(|record| {
            let status = record.status().unwrap_or("training");
            let issues = record
                .summary
                .get("issues")
                .and_then(|v| v.as_array())
                .map(|a| a.len())
                .unwrap_or(0);
            format!(
                "{:>5}  {}  {:<8} {} issue(s)",
                style(record.id).dim(),
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                status,
                issues,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_trend(trend: &StatusTrend) -> String {
    format!(
        "{} over {} run(s): {} success, {} failed, {} skipped, {} other (success rate {:.1}%, last: {})",
        style(&trend.agent_name).cyan().bold(),
        trend.runs,
        style(trend.success).green(),
        style(trend.failed).red(),
        style(trend.skipped).yellow(),
        trend.other,
        trend.success_rate(),
        trend.last_status.as_deref().unwrap_or("n/a"),
    )
}
