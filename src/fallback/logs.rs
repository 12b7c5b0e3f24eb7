use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::parser::LogLineParser;
use super::synthetic::{generate_logs, SyntheticLogPolicy};
use super::{FallbackDataSource, Unavailable};
use crate::errors::{PipelineError, RetryExecutor};
use crate::models::log_record::LogRecord;
use crate::runner::{CommandAction, ExternalAction};

/// Service logs from the cluster, or generated ones when the cluster is down.
pub struct KubectlLogSource {
    action: Box<dyn ExternalAction>,
    executor: RetryExecutor,
    parser: LogLineParser,
    synthetic: SyntheticLogPolicy,
}

impl KubectlLogSource {
    /// `kubectl logs -l <selector> -n <namespace>`.
    pub fn new(
        selector: &str,
        namespace: &str,
        executor: RetryExecutor,
        synthetic: SyntheticLogPolicy,
    ) -> Result<Self, PipelineError> {
        let action = CommandAction::new("kubectl", ["logs", "-l", selector, "-n", namespace]);
        Self::with_action(Box::new(action), executor, synthetic)
    }

    /// Use any action whose stdout is a log dump.
    pub fn with_action(
        action: Box<dyn ExternalAction>,
        executor: RetryExecutor,
        synthetic: SyntheticLogPolicy,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            action,
            executor,
            parser: LogLineParser::new()?,
            synthetic,
        })
    }
}

#[async_trait]
impl FallbackDataSource for KubectlLogSource {
    type Data = Vec<LogRecord>;

    fn name(&self) -> &str {
        self.action.name()
    }

    async fn fetch_real(&self) -> Result<Vec<LogRecord>, Unavailable> {
        let outcome = self.executor.execute(self.action.as_ref()).await;
        if !outcome.succeeded {
            return Err(Unavailable::new(format!(
                "log fetch failed after {} attempt(s): {}",
                outcome.attempts_used,
                outcome.diagnostic()
            )));
        }

        let text = outcome.stdout();
        let records = self.parser.parse_text(text);
        let total_lines = text.lines().filter(|l| !l.trim().is_empty()).count();
        debug!(
            parsed = records.len(),
            skipped = total_lines.saturating_sub(records.len()),
            "Parsed service logs"
        );

        if records.is_empty() {
            return Err(Unavailable::new(if total_lines == 0 {
                "log fetch returned no output".to_string()
            } else {
                format!("none of {} log lines could be parsed", total_lines)
            }));
        }
        Ok(records)
    }

    fn generate_synthetic(&self) -> Vec<LogRecord> {
        generate_logs(&self.synthetic, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{BackoffPolicy, RetryPolicy};
    use crate::fallback::{fetch_or_synthesize, DataOrigin};
    use crate::runner::ActionOutput;
    use std::time::Duration;

    struct Canned(Result<&'static str, &'static str>);

    #[async_trait]
    impl ExternalAction for Canned {
        fn name(&self) -> &str {
            "kubectl logs"
        }

        async fn run(&self) -> Result<ActionOutput, PipelineError> {
            match self.0 {
                Ok(stdout) => Ok(ActionOutput {
                    success: true,
                    exit_code: Some(0),
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
                Err(msg) => Err(PipelineError::Command(msg.to_string())),
            }
        }
    }

    fn source(action: Canned) -> KubectlLogSource {
        let executor = RetryExecutor::new(RetryPolicy {
            max_attempts: 2,
            backoff: BackoffPolicy::Fixed(Duration::ZERO),
            attempt_timeout: Duration::from_secs(5),
        });
        let synthetic = SyntheticLogPolicy {
            seed: Some(1),
            ..Default::default()
        };
        KubectlLogSource::with_action(Box::new(action), executor, synthetic).unwrap()
    }

    #[tokio::test]
    async fn test_uses_cluster_logs_when_parsable() {
        let src = source(Canned(Ok(
            "2025-03-01 10:00:00 INFO [microservice-pod-0] Request processed successfully\n\
             garbage\n\
             2025-03-01 10:01:00 ERROR [microservice-pod-1] HTTP 500 error: Internal Server Error\n",
        )));
        let sourced = fetch_or_synthesize(&src).await;
        assert_eq!(sourced.origin, DataOrigin::Cluster);
        assert_eq!(sourced.data.len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_cluster_falls_back() {
        let src = source(Canned(Err("kubectl: not found")));
        let sourced = fetch_or_synthesize(&src).await;
        assert_eq!(sourced.origin, DataOrigin::Synthetic);
        assert_eq!(sourced.data.len(), 50);
        assert!(sourced.fallback_reason.unwrap().contains("kubectl: not found"));
        assert!(sourced.data.iter().all(|r| r.status_code.is_some() && r.response_time_ms.is_some()));
    }

    #[tokio::test]
    async fn test_unparsable_output_counts_as_unavailable() {
        let src = source(Canned(Ok("error: no resources found\n")));
        let err = src.fetch_real().await.unwrap_err();
        assert!(err.reason.contains("could not be parsed"));
    }

    #[tokio::test]
    async fn test_empty_output_counts_as_unavailable() {
        let src = source(Canned(Ok("")));
        assert!(src.fetch_real().await.is_err());
    }
}
