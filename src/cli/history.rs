use crate::errors::PipelineError;
use crate::reporting::{format_report_markdown, read_report};
use super::commands::{HistoryArgs, ShowArgs, TrendArgs};
use super::context::{open_history, Overrides};
use super::render::{render_history, render_trend};

pub async fn handle_history(overrides: &Overrides, args: HistoryArgs) -> Result<i32, PipelineError> {
    let config = overrides.load().await?;
    let records = open_history(&config)?.recent_history(args.agent.as_str(), args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!("{}", render_history(&records));
    }
    Ok(0)
}

pub async fn handle_trend(overrides: &Overrides, args: TrendArgs) -> Result<i32, PipelineError> {
    let config = overrides.load().await?;
    let trend = open_history(&config)?.status_trend(args.agent.as_str(), args.limit)?;
    println!("{}", render_trend(&trend));
    Ok(0)
}

pub async fn handle_show(overrides: &Overrides, args: ShowArgs) -> Result<i32, PipelineError> {
    let config = overrides.load().await?;
    let report = read_report(&config.output.report_dir, args.stage.report_filename())
        .await?
        .ok_or_else(|| {
            PipelineError::Report(format!(
                "No {} in {}; run `stagecraft run {}` first",
                args.stage.report_filename(),
                config.output.report_dir.display(),
                args.stage
            ))
        })?;
    println!("{}", format_report_markdown(&report));
    Ok(0)
}
