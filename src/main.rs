use clap::Parser;
use tracing_subscriber::EnvFilter;

use stagecraft::cli;
use stagecraft::errors::PipelineError;

#[tokio::main]
async fn main() {
    // A missing .env is the normal case
    let _ = dotenv::dotenv();

    let cli = cli::Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .with_writer(std::io::stderr)
            .init();
    }

    if cli.no_color {
        console::set_colors_enabled(false);
    }

    let exit_code = match cli::dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                PipelineError::Config(_) => 2,
                _ => 1,
            }
        }
    };
    std::process::exit(exit_code);
}
