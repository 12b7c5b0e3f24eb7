//! Autonomous CI/CD stage agents.
//!
//! Each stage (build, test, deploy, log analysis) runs its external tools
//! under a retry policy, falls back to synthetic input when its data source is
//! down, asks an optional analyzer for extra findings, and always leaves
//! exactly one JSON report behind for the dashboard.

pub mod agents;
pub mod analyzer;
pub mod config;
pub mod db;
pub mod errors;
pub mod fallback;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod reporting;
pub mod runner;
pub mod utils;

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "cli")]
pub mod cli;
