use console::style;

use crate::config::parse_config_with_warnings;
use crate::errors::PipelineError;
use super::commands::ValidateArgs;

pub async fn handle_validate(args: ValidateArgs) -> Result<i32, PipelineError> {
    let (config, warnings) = parse_config_with_warnings(&args.config).await?;
    for warning in &warnings {
        println!("  {} {}", style("warning:").yellow(), warning);
    }
    println!(
        "{} Configuration is valid: {} (analyzer: {}, retry: {} attempt(s))",
        style("✓").green(),
        args.config.display(),
        config.analyzer.provider.as_deref().unwrap_or("disabled"),
        config.retry.max_attempts,
    );
    Ok(0)
}
