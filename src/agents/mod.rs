pub mod build;
pub mod deploy;
pub mod executor;
pub mod log_analysis;
pub mod registry;
pub mod stats;
pub mod strategy;

pub use build::BuildStrategy;
pub use deploy::{DeployStrategy, Provisioning};
pub use executor::{setup_failure, StageAgent, StagePhase, StageRun};
pub use log_analysis::{LogAnalysisStrategy, LogSource};
pub use registry::{create_strategy, AgentName};
pub use stats::LogStats;
pub use strategy::{Preparation, StageContext, StageStrategy};
pub use test::TestStrategy;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::errors::{BackoffPolicy, PipelineError, RetryExecutor, RetryPolicy};
    use crate::runner::{ActionOutput, ExternalAction};

    /// What one scripted invocation does.
    #[derive(Debug, Clone)]
    pub enum Step {
        Ok(&'static str),
        Exit(i32, &'static str),
        Unreachable(&'static str),
    }

    /// Plays its steps in order, repeating the last; counts invocations.
    pub struct ScriptedAction {
        name: &'static str,
        steps: Mutex<Vec<Step>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedAction {
        pub fn new(name: &'static str, steps: Vec<Step>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let action = Self {
                name,
                steps: Mutex::new(steps),
                calls: calls.clone(),
            };
            (action, calls)
        }
    }

    #[async_trait]
    impl ExternalAction for ScriptedAction {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(&self) -> Result<ActionOutput, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = {
                let mut steps = self.steps.lock().unwrap();
                if steps.len() > 1 {
                    steps.remove(0)
                } else {
                    steps[0].clone()
                }
            };
            match step {
                Step::Ok(stdout) => Ok(ActionOutput {
                    success: true,
                    exit_code: Some(0),
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
                Step::Exit(code, stderr) => Ok(ActionOutput {
                    success: false,
                    exit_code: Some(code),
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                }),
                Step::Unreachable(msg) => Err(PipelineError::Network(msg.to_string())),
            }
        }
    }

    pub fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: BackoffPolicy::Fixed(Duration::ZERO),
            attempt_timeout: Duration::from_secs(5),
        }
    }

    pub fn instant_executor(max_attempts: u32) -> RetryExecutor {
        RetryExecutor::new(instant_policy(max_attempts))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::testing::*;
    use super::*;
    use crate::analyzer::testing::scripted;
    use crate::analyzer::Analyzer;
    use crate::config::LogAnalysisConfig;
    use crate::fallback::{KubectlLogSource, SyntheticLogPolicy};
    use crate::models::report::ReportStatus;

    fn disabled() -> Arc<Analyzer> {
        Arc::new(Analyzer::disabled())
    }

    #[tokio::test]
    async fn test_deploy_recovers_from_flaky_provisioning() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("deployment.yaml");
        std::fs::write(&manifest, "apiVersion: apps/v1\nkind: Deployment\n").unwrap();

        let (provision, provision_calls) = ScriptedAction::new(
            "kind create cluster",
            vec![
                Step::Exit(1, "ERROR: failed to create cluster: docker not ready"),
                Step::Exit(1, "ERROR: failed to create cluster: docker not ready"),
                Step::Ok("Creating cluster \"kind\" ..."),
            ],
        );
        let (apply, _) = ScriptedAction::new("kubectl apply", vec![Step::Ok("deployment.apps/microservice created")]);
        let (pods, _) = ScriptedAction::new("kubectl get pods", vec![Step::Ok("Running")]);

        let strategy = DeployStrategy::with_actions(
            manifest,
            "microservice",
            Some(Provisioning {
                action: Box::new(provision),
                policy: instant_policy(3),
            }),
            Box::new(apply),
            Some(Box::new(pods)),
        );
        let run = StageAgent::new(Box::new(strategy), disabled(), instant_executor(3), dir.path())
            .run()
            .await;

        assert_eq!(provision_calls.load(Ordering::SeqCst), 3);
        assert_eq!(run.report.status, ReportStatus::Success);
        assert!(run.report.issues.is_empty());
        assert_eq!(run.report.field("deployment"), Some(&serde_json::json!("microservice")));
        assert_eq!(run.report.field("pod_status"), Some(&serde_json::json!("Running")));
        assert_eq!(run.exit_code, 0);
    }

    #[tokio::test]
    async fn test_existing_cluster_counts_as_provisioned() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("deployment.yaml");
        std::fs::write(&manifest, "kind: Deployment\n").unwrap();

        let (provision, _) = ScriptedAction::new(
            "kind create cluster",
            vec![Step::Exit(1, "ERROR: failed to create cluster: node(s) already exist for a cluster with the name \"kind\"")],
        );
        let (apply, _) = ScriptedAction::new("kubectl apply", vec![Step::Ok("configured")]);
        let strategy = DeployStrategy::with_actions(
            manifest,
            "microservice",
            Some(Provisioning {
                action: Box::new(provision),
                policy: instant_policy(2),
            }),
            Box::new(apply),
            None,
        );
        let run = StageAgent::new(Box::new(strategy), disabled(), instant_executor(1), dir.path())
            .run()
            .await;

        assert_eq!(run.report.status, ReportStatus::Success);
        assert_eq!(run.report.field("pod_status"), Some(&serde_json::json!("unknown")));
    }

    #[tokio::test]
    async fn test_deploy_without_manifest_never_provisions() {
        let dir = tempfile::tempdir().unwrap();
        let (provision, provision_calls) = ScriptedAction::new("kind create cluster", vec![Step::Ok("")]);
        let (apply, apply_calls) = ScriptedAction::new("kubectl apply", vec![Step::Ok("")]);

        let strategy = DeployStrategy::with_actions(
            dir.path().join("deployment.yaml"),
            "microservice",
            Some(Provisioning {
                action: Box::new(provision),
                policy: instant_policy(3),
            }),
            Box::new(apply),
            None,
        );
        let run = StageAgent::new(Box::new(strategy), disabled(), instant_executor(3), dir.path())
            .run()
            .await;

        assert_eq!(provision_calls.load(Ordering::SeqCst), 0);
        assert_eq!(apply_calls.load(Ordering::SeqCst), 0);
        assert_eq!(run.report.status, ReportStatus::Failed);
        assert!(run.report.has_issue("deployment.yaml not found"));
        assert!(run
            .report
            .mitigations
            .contains(&"Ensure deployment.yaml is in the repository root".to_string()));
    }

    #[tokio::test]
    async fn test_apply_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("deployment.yaml");
        std::fs::write(&manifest, "kind: Deployment\n").unwrap();

        let (apply, apply_calls) = ScriptedAction::new(
            "kubectl apply",
            vec![Step::Exit(1, "error: unable to recognize \"deployment.yaml\"")],
        );
        let strategy = DeployStrategy::with_actions(manifest, "microservice", None, Box::new(apply), None);
        let run = StageAgent::new(Box::new(strategy), disabled(), instant_executor(2), dir.path())
            .run()
            .await;

        assert_eq!(apply_calls.load(Ordering::SeqCst), 2);
        assert_eq!(run.report.status, ReportStatus::Failed);
        assert!(run.report.has_issue("kubectl apply failed: error: unable to recognize"));
        assert!(run
            .report
            .mitigations
            .contains(&"Check deployment.yaml and the cluster".to_string()));
    }

    #[tokio::test]
    async fn test_synthetic_logs_flag_high_error_rate() {
        let dir = tempfile::tempdir().unwrap();
        let synthetic = SyntheticLogPolicy {
            count: 100,
            error_ratio: 0.12,
            seed: Some(7),
            ..Default::default()
        };
        let (logs, log_calls) = ScriptedAction::new("kubectl logs", vec![Step::Unreachable("connection refused")]);
        let source = KubectlLogSource::with_action(Box::new(logs), instant_executor(2), synthetic).unwrap();

        let strategy = LogAnalysisStrategy::new(Box::new(source), &LogAnalysisConfig::default());
        let run = StageAgent::new(Box::new(strategy), disabled(), instant_executor(2), dir.path())
            .run()
            .await;

        assert_eq!(log_calls.load(Ordering::SeqCst), 2);
        assert_eq!(run.report.status, ReportStatus::Success);
        assert_eq!(run.report.field("total_requests"), Some(&serde_json::json!(100)));
        assert_eq!(run.report.field("error_rate"), Some(&serde_json::json!(12.0)));
        assert_eq!(run.report.field("data_source"), Some(&serde_json::json!("synthetic")));
        assert!(run.report.has_issue("high error rate"));
        assert!(dir.path().join("log_analysis_report.md").exists());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (probe, _) = ScriptedAction::new("GET /health", vec![Step::Unreachable("connection refused")]);
        let strategy = TestStrategy::with_probe("http://localhost:5000/health", Box::new(probe), Some(1));
        let run = StageAgent::new(Box::new(strategy), disabled(), instant_executor(3), dir.path())
            .run()
            .await;

        assert_eq!(run.report.status, ReportStatus::Skipped);
        assert_eq!(run.exit_code, 0);
        assert!(run.report.mitigations.iter().any(|m| m.contains("Verify the service is running")));
    }

    #[tokio::test]
    async fn test_erroring_service_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (probe, _) = ScriptedAction::new("GET /health", vec![Step::Exit(503, "Service Unavailable")]);
        let strategy = TestStrategy::with_probe("http://localhost:5000/health", Box::new(probe), Some(1));
        let run = StageAgent::new(Box::new(strategy), disabled(), instant_executor(3), dir.path())
            .run()
            .await;

        assert_eq!(run.report.status, ReportStatus::Failed);
        assert!(run.report.has_issue("Health check failed: HTTP 503"));
    }

    #[tokio::test]
    async fn test_analyzer_garbage_leaves_status_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (build, _) = ScriptedAction::new("docker build", vec![Step::Ok("Successfully built")]);
        let strategy = BuildStrategy::with_actions("ghcr.io/me/myimage:latest".into(), Box::new(build), None);
        let analyzer = Arc::new(scripted(vec![Ok("I think everything looks fine!")]));
        let run = StageAgent::new(Box::new(strategy), analyzer, instant_executor(1), dir.path())
            .run()
            .await;

        assert_eq!(run.report.status, ReportStatus::Success);
        assert_eq!(run.report.field("image"), Some(&serde_json::json!("ghcr.io/me/myimage:latest")));
        assert!(run.report.mitigations.iter().any(|m| m.starts_with("Analyzer note:")));
    }

    #[tokio::test]
    async fn test_analyzer_outage_leaves_status_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (build, _) = ScriptedAction::new("docker build", vec![Step::Exit(1, "failed to read dockerfile")]);
        let strategy = BuildStrategy::with_actions("ghcr.io/me/myimage:latest".into(), Box::new(build), None);
        let analyzer = Arc::new(scripted(vec![Err("connection reset")]));
        let run = StageAgent::new(Box::new(strategy), analyzer, instant_executor(1), dir.path())
            .run()
            .await;

        assert_eq!(run.report.status, ReportStatus::Failed);
        assert!(run.report.mitigations.contains(&"Check Dockerfile and build context".to_string()));
        assert!(run.report.mitigations.iter().any(|m| m.starts_with("Analyzer unavailable:")));
        assert_eq!(run.report.field("image"), Some(&serde_json::json!("")));
    }

    #[tokio::test]
    async fn test_missing_docker_is_a_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (build, _) = ScriptedAction::new("docker build", vec![Step::Unreachable("docker: not found")]);
        let strategy = BuildStrategy::with_actions("img".into(), Box::new(build), None);
        let run = StageAgent::new(Box::new(strategy), disabled(), instant_executor(1), dir.path())
            .run()
            .await;

        assert_eq!(run.report.status, ReportStatus::Failed);
        assert!(run
            .report
            .mitigations
            .contains(&"Check Docker installation and permissions".to_string()));
    }
}
