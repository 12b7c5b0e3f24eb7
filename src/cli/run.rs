use tracing::info;

use crate::errors::PipelineError;
use super::commands::{PipelineArgs, RunArgs};
use super::context::{orchestrator, Overrides};
use super::render::{render_pipeline_summary, render_stage_run};

pub async fn handle_run(overrides: &Overrides, args: RunArgs) -> Result<i32, PipelineError> {
    let config = overrides.load().await?;
    info!(stage = %args.stage, report_dir = %config.output.report_dir.display(), "Running stage");

    let run = orchestrator(config)?.run_stage(args.stage).await;
    println!("{}", render_stage_run(&run));
    Ok(run.exit_code)
}

pub async fn handle_pipeline(overrides: &Overrides, args: PipelineArgs) -> Result<i32, PipelineError> {
    let config = overrides.load().await?;
    let summary = orchestrator(config)?.keep_going(args.keep_going).run().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", render_pipeline_summary(&summary));
    }
    Ok(summary.exit_code())
}
