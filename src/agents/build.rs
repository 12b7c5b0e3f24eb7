use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::config::BuildConfig;
use crate::errors::PipelineError;
use crate::models::outcome::{FailureKind, RetryOutcome};
use crate::models::report::ReportStatus;
use crate::runner::{CommandAction, ExternalAction};
use super::registry::AgentName;
use super::strategy::{brief, Preparation, StageContext, StageStrategy};

const BUILD_MITIGATION: &str = "Check Dockerfile and build context";
const PUSH_MITIGATION: &str = "Verify registry credentials and network";
const TOOL_MITIGATION: &str = "Check Docker installation and permissions";

/// Builds the service image and pushes it to the registry.
pub struct BuildStrategy {
    image: String,
    build: Box<dyn ExternalAction>,
    push: Option<Box<dyn ExternalAction>>,
}

impl BuildStrategy {
    pub fn from_config(config: &BuildConfig, workdir: &Path) -> Self {
        let image = config.image_ref();
        let context = workdir.join(&config.context);
        let build = CommandAction::new(
            "docker",
            ["build".to_string(), "-t".to_string(), image.clone(), context.display().to_string()],
        );
        let push = config
            .push
            .then(|| Box::new(CommandAction::new("docker", ["push", image.as_str()])) as Box<dyn ExternalAction>);
        Self::with_actions(image, Box::new(build), push)
    }

    pub fn with_actions(
        image: String,
        build: Box<dyn ExternalAction>,
        push: Option<Box<dyn ExternalAction>>,
    ) -> Self {
        Self { image, build, push }
    }

    fn fail(ctx: &mut StageContext, step: &str, outcome: &RetryOutcome, mitigation: &str) {
        match outcome.failure_kind() {
            Some(FailureKind::Unavailable) => ctx.report.fail(
                format!("Docker {} could not run: {}", step, brief(&outcome.diagnostic())),
                TOOL_MITIGATION,
            ),
            Some(FailureKind::TimedOut) => ctx.report.fail(
                format!("Docker {} timed out: {}", step, brief(&outcome.diagnostic())),
                mitigation,
            ),
            _ => ctx.report.fail(
                format!("Docker {} failed: {}", step, brief(&outcome.diagnostic())),
                mitigation,
            ),
        }
    }
}

#[async_trait]
impl StageStrategy for BuildStrategy {
    fn agent(&self) -> AgentName {
        AgentName::Build
    }

    async fn prepare(&mut self, ctx: &mut StageContext) -> Result<Preparation, PipelineError> {
        // Only set to the real reference once the image is pushed
        ctx.report.set_field("image", "");
        Ok(Preparation::Ready)
    }

    async fn execute(&mut self, ctx: &mut StageContext) -> Result<(), PipelineError> {
        info!(image = %self.image, "Building image");
        let outcome = ctx.executor.execute(self.build.as_ref()).await;
        ctx.record_outcome(&outcome);
        if !outcome.succeeded {
            Self::fail(ctx, "build", &outcome, BUILD_MITIGATION);
            return Ok(());
        }

        if let Some(push) = &self.push {
            info!(image = %self.image, "Pushing image");
            let outcome = ctx.executor.execute(push.as_ref()).await;
            ctx.record_outcome(&outcome);
            if !outcome.succeeded {
                Self::fail(ctx, "push", &outcome, PUSH_MITIGATION);
                return Ok(());
            }
        }

        ctx.report.set_status(ReportStatus::Success);
        ctx.report.set_field("image", &self.image);
        Ok(())
    }
}
