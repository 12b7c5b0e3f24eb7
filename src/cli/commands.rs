use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::agents::AgentName;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ", built ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "stagecraft", version = VERSION, about = "Autonomous CI/CD stage agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML configuration file (default: ./stagecraft.yaml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory the stage reports are written to
    #[arg(long, global = true)]
    pub report_dir: Option<PathBuf>,

    /// SQLite history database
    #[arg(long, global = true)]
    pub history_db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single stage
    Run(RunArgs),
    /// Run build, test, deploy and log-analysis in order
    Pipeline(PipelineArgs),
    /// Show recent history records of an agent
    History(HistoryArgs),
    /// Show status counts over an agent's recent runs
    Trend(TrendArgs),
    /// Print the last report of a stage as markdown
    Show(ShowArgs),
    /// Ask the analyzer for improvement suggestions from an agent's history
    Train(TrainArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
    /// Serve the read-only dashboard feed over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Stage to run
    #[arg(value_enum)]
    pub stage: AgentName,
}

#[derive(Args, Clone)]
pub struct PipelineArgs {
    /// Run the remaining stages after one fails
    #[arg(long)]
    pub keep_going: bool,

    /// Print the pipeline summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct HistoryArgs {
    #[arg(value_enum)]
    pub agent: AgentName,

    /// Number of records to show
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct TrendArgs {
    #[arg(value_enum)]
    pub agent: AgentName,

    /// Number of recent runs to count
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[derive(Args, Clone)]
pub struct ShowArgs {
    #[arg(value_enum)]
    pub stage: AgentName,
}

#[derive(Args, Clone)]
pub struct TrainArgs {
    #[arg(value_enum)]
    pub agent: AgentName,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: PathBuf,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen port
    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Listen address
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}
