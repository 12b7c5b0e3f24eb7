use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::DeployConfig;
use crate::errors::{BackoffPolicy, PipelineError, RetryPolicy};
use crate::models::outcome::FailureKind;
use crate::models::report::ReportStatus;
use crate::runner::{CommandAction, ExternalAction};
use super::registry::{short_timeout, AgentName};
use super::strategy::{brief, Preparation, StageContext, StageStrategy};

const POD_STATUS_TIMEOUT_SECS: u64 = 30;

/// Cluster provisioning step and its own retry budget.
pub struct Provisioning {
    pub action: Box<dyn ExternalAction>,
    pub policy: RetryPolicy,
}

/// Applies the manifest to a (possibly freshly provisioned) cluster.
pub struct DeployStrategy {
    manifest: PathBuf,
    deployment_name: String,
    provisioning: Option<Provisioning>,
    apply: Box<dyn ExternalAction>,
    pod_status: Option<Box<dyn ExternalAction>>,
}

impl DeployStrategy {
    pub fn from_config(config: &DeployConfig, workdir: &Path) -> Self {
        let manifest = workdir.join(&config.manifest);
        let manifest_arg = manifest.display().to_string();

        let provisioning = config.provision.then(|| Provisioning {
            action: Box::new(CommandAction::new(
                "kind",
                ["create", "cluster", "--name", config.cluster_name.as_str()],
            )),
            policy: RetryPolicy {
                max_attempts: config.provision_attempts,
                backoff: BackoffPolicy::Fixed(config.provision_delay()),
                attempt_timeout: Duration::from_secs(600),
            },
        });

        let apply = CommandAction::new("kubectl", ["apply", "-f", manifest_arg.as_str()]);
        let pod_status = CommandAction::new(
            "kubectl",
            [
                "get",
                "pods",
                "-l",
                config.pod_selector.as_str(),
                "-n",
                config.namespace.as_str(),
                "-o",
                "jsonpath={.items[*].status.phase}",
            ],
        );

        Self::with_actions(
            manifest,
            &config.deployment_name,
            provisioning,
            Box::new(apply),
            Some(Box::new(pod_status)),
        )
    }

    pub fn with_actions(
        manifest: PathBuf,
        deployment_name: &str,
        provisioning: Option<Provisioning>,
        apply: Box<dyn ExternalAction>,
        pod_status: Option<Box<dyn ExternalAction>>,
    ) -> Self {
        Self {
            manifest,
            deployment_name: deployment_name.to_string(),
            provisioning,
            apply,
            pod_status,
        }
    }

    fn manifest_name(&self) -> String {
        self.manifest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.manifest.display().to_string())
    }

    /// True when the cluster is ready; on false the failure is already in the report.
    async fn provision(&self, ctx: &mut StageContext) -> bool {
        let Some(provisioning) = &self.provisioning else {
            debug!("Provisioning disabled, using the existing cluster");
            return true;
        };

        let executor = ctx.executor.with_policy(provisioning.policy.clone());
        let outcome = executor.execute(provisioning.action.as_ref()).await;
        ctx.record_outcome(&outcome);
        if outcome.succeeded {
            info!(attempts = outcome.attempts_used, "Cluster provisioned");
            return true;
        }

        // kind refuses to recreate a cluster that is already there
        if outcome.diagnostic().to_lowercase().contains("already exist") {
            info!("Cluster already exists, reusing it");
            return true;
        }

        let issue = match outcome.failure_kind() {
            Some(FailureKind::Unavailable) => format!("Cluster provisioning could not run: {}", brief(&outcome.diagnostic())),
            _ => format!(
                "Cluster provisioning failed after {} attempt(s): {}",
                outcome.attempts_used,
                brief(&outcome.diagnostic())
            ),
        };
        ctx.report.fail(issue, "Check the cluster provisioning tool and container runtime");
        false
    }

    async fn query_pod_status(&self, ctx: &mut StageContext) -> String {
        let Some(action) = &self.pod_status else {
            return "unknown".to_string();
        };
        let mut policy = ctx.executor.policy().once();
        policy.attempt_timeout = short_timeout(POD_STATUS_TIMEOUT_SECS);
        let outcome = ctx.executor.with_policy(policy).execute(action.as_ref()).await;
        let phases = outcome.stdout().trim();
        if outcome.succeeded && !phases.is_empty() {
            phases.to_string()
        } else {
            warn!(error = %outcome.diagnostic(), "Pod status unavailable");
            "unknown".to_string()
        }
    }
}

#[async_trait]
impl StageStrategy for DeployStrategy {
    fn agent(&self) -> AgentName {
        AgentName::Deploy
    }

    async fn prepare(&mut self, ctx: &mut StageContext) -> Result<Preparation, PipelineError> {
        if !self.manifest.is_file() {
            let name = self.manifest_name();
            warn!(manifest = %self.manifest.display(), "Manifest missing, not deploying");
            ctx.report.fail(
                format!("{} not found", name),
                format!("Ensure {} is in the repository root", name),
            );
            return Ok(Preparation::Blocked);
        }
        Ok(Preparation::Ready)
    }

    async fn execute(&mut self, ctx: &mut StageContext) -> Result<(), PipelineError> {
        if !self.provision(ctx).await {
            return Ok(());
        }

        let outcome = ctx.executor.execute(self.apply.as_ref()).await;
        ctx.record_outcome(&outcome);
        if !outcome.succeeded {
            let name = self.manifest_name();
            match outcome.failure_kind() {
                Some(FailureKind::Rejected) => {
                    let stderr = outcome.stderr().trim();
                    let detail = if stderr.is_empty() { outcome.diagnostic() } else { stderr.to_string() };
                    ctx.report.fail(
                        format!("kubectl apply failed: {}", detail),
                        format!("Check {} and the cluster", name),
                    );
                }
                _ => ctx.report.fail(
                    format!("kubectl apply could not run: {}", brief(&outcome.diagnostic())),
                    "Check kubectl installation and the cluster",
                ),
            }
            return Ok(());
        }

        ctx.report.set_status(ReportStatus::Success);
        ctx.report.set_field("deployment", &self.deployment_name);
        let pod_status = self.query_pod_status(ctx).await;
        ctx.report.set_field("pod_status", pod_status);
        Ok(())
    }
}
