use async_trait::async_trait;
use crate::errors::PipelineError;

/// Observable result of one invocation of an external tool.
#[derive(Debug, Clone, Default)]
pub struct ActionOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// A single external command or API call.
///
/// `Ok` means the action ran and reported an outcome (which may still be a
/// failure); `Err` means it could not be run or reached at all.
#[async_trait]
pub trait ExternalAction: Send + Sync {
    /// Short label for logs and diagnostics.
    fn name(&self) -> &str;

    async fn run(&self) -> Result<ActionOutput, PipelineError>;
}
