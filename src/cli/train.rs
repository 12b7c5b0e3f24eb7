use crate::analyzer::training::suggest_improvements;
use crate::analyzer::Analyzer;
use crate::errors::PipelineError;
use super::commands::TrainArgs;
use super::context::{open_history, Overrides};

pub async fn handle_train(overrides: &Overrides, args: TrainArgs) -> Result<i32, PipelineError> {
    let config = overrides.load().await?;
    let analyzer = Analyzer::from_config(&config.analyzer)?;
    let history = open_history(&config)?;

    let summary = suggest_improvements(&analyzer, &history, args.agent.as_str()).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(0)
}
