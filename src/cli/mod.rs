pub mod commands;
pub mod context;
pub mod history;
pub mod render;
pub mod run;
pub mod serve;
pub mod train;
pub mod validate;

pub use commands::{Cli, Commands};

use crate::errors::PipelineError;
use context::Overrides;

/// Dispatch a parsed command; `Ok` carries the process exit code.
pub async fn dispatch(cli: Cli) -> Result<i32, PipelineError> {
    let overrides = Overrides::from_cli(&cli);
    match cli.command {
        Commands::Run(args) => run::handle_run(&overrides, args).await,
        Commands::Pipeline(args) => run::handle_pipeline(&overrides, args).await,
        Commands::History(args) => history::handle_history(&overrides, args).await,
        Commands::Trend(args) => history::handle_trend(&overrides, args).await,
        Commands::Show(args) => history::handle_show(&overrides, args).await,
        Commands::Train(args) => train::handle_train(&overrides, args).await,
        Commands::Validate(args) => validate::handle_validate(args).await,
        Commands::Serve(args) => serve::handle_serve(&overrides, args).await,
    }
}
