use std::future::Future;
use std::time::{Duration, Instant};

use super::classification::ErrorClassification;
use super::types::PipelineError;
use crate::models::outcome::{AttemptRecord, RetryOutcome};
use crate::runner::ExternalAction;
use crate::utils::truncation::{truncate_error, truncate_output};
use tracing::{debug, info, warn};

/// How long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffPolicy {
    /// Same delay after every failed attempt.
    Fixed(Duration),
    /// `base * 2^(attempt-1)` plus up to one second of jitter, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Fixed(Duration::from_secs(5))
    }
}

impl BackoffPolicy {
    /// Delay to sleep after the given 1-based attempt failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            BackoffPolicy::Fixed(delay) => delay,
            BackoffPolicy::Exponential { base, max } => {
                let exp = 2.0_f64.powi(attempt.saturating_sub(1).min(30) as i32);
                let jitter: f64 = if base.is_zero() { 0.0 } else { rand::random::<f64>() };
                let secs = (base.as_secs_f64() * exp + jitter).min(max.as_secs_f64());
                Duration::try_from_secs_f64(secs).unwrap_or(max)
            }
        }
    }
}

impl ErrorClassification {
    /// Delay before retrying an error of this classification.
    ///
    /// Rate limits back off on their own schedule (30s + 10s per attempt,
    /// capped at 120s); everything else follows the caller's policy.
    pub fn retry_delay(&self, attempt: u32, backoff: &BackoffPolicy) -> Duration {
        match self.error_type {
            "RateLimitError" => {
                let secs = 30 + (attempt as u64 * 10);
                Duration::from_secs(secs.min(120))
            }
            _ => backoff.delay(attempt),
        }
    }
}

/// Bounds for retrying one external action.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
    /// Deadline for a single attempt; a hung tool counts as a failed attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffPolicy::default(),
            attempt_timeout: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// A single attempt with the same deadline.
    pub fn once(&self) -> Self {
        self.clone().with_max_attempts(1)
    }
}

/// Runs external actions under a retry policy and captures every attempt.
///
/// `execute` never fails: spawn errors, timeouts and non-zero exits all end
/// up in the returned [`RetryOutcome`].
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Same executor with a different policy, e.g. a one-shot variant.
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub async fn execute(&self, action: &dyn ExternalAction) -> RetryOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts: Vec<AttemptRecord> = Vec::with_capacity(max_attempts as usize);

        for attempt in 1..=max_attempts {
            let start = Instant::now();
            let result = match tokio::time::timeout(self.policy.attempt_timeout, action.run()).await {
                Ok(result) => result,
                Err(_) => Err(PipelineError::Timeout(format!(
                    "`{}` did not finish within {}s",
                    action.name(),
                    self.policy.attempt_timeout.as_secs()
                ))),
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            let record = match result {
                Ok(output) => AttemptRecord {
                    attempt,
                    success: output.success,
                    exit_code: output.exit_code,
                    stdout: truncate_output(&output.stdout),
                    stderr: truncate_output(&output.stderr),
                    error: None,
                    error_type: None,
                    duration_ms,
                },
                Err(e) => AttemptRecord {
                    attempt,
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    error: Some(truncate_error(&e.to_string())),
                    error_type: Some(e.classify().error_type),
                    duration_ms,
                },
            };

            debug!(
                action = action.name(),
                attempt,
                exit_code = ?record.exit_code,
                stdout = %record.stdout,
                stderr = %record.stderr,
                "Attempt finished"
            );

            let succeeded = record.success;
            let diagnostic = record.diagnostic();
            attempts.push(record);

            if succeeded {
                info!(action = action.name(), attempt, duration_ms, "Action succeeded");
                return RetryOutcome {
                    action: action.name().to_string(),
                    attempts_used: attempt,
                    succeeded: true,
                    last_error: None,
                    attempts,
                };
            }

            if attempt < max_attempts {
                let delay = self.policy.backoff.delay(attempt);
                warn!(
                    action = action.name(),
                    attempt,
                    max = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %truncate_error(&diagnostic),
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            } else {
                warn!(
                    action = action.name(),
                    attempts = max_attempts,
                    error = %truncate_error(&diagnostic),
                    "Max attempts exhausted"
                );
            }
        }

        let last_error = attempts.last().map(AttemptRecord::diagnostic);
        RetryOutcome {
            action: action.name().to_string(),
            attempts_used: max_attempts,
            succeeded: false,
            last_error,
            attempts,
        }
    }
}

/// Execute an async operation with retry logic.
///
/// Retries only if the error is classified as retryable and attempts remain.
/// Each attempt is bounded by the policy's attempt timeout.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut factory: F,
) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let result = match tokio::time::timeout(policy.attempt_timeout, factory()).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout(format!(
                "{} did not finish within {}s",
                operation_name,
                policy.attempt_timeout.as_secs()
            ))),
        };

        let e = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let classification = e.classify();
        if !classification.retryable || attempt >= max_attempts {
            if !classification.retryable {
                warn!(
                    operation = operation_name,
                    error_type = classification.error_type,
                    "Non-retryable error, failing immediately"
                );
            } else {
                warn!(
                    operation = operation_name,
                    attempt,
                    max = max_attempts,
                    "Max retries exhausted"
                );
            }
            return Err(e);
        }

        let delay = classification.retry_delay(attempt, &policy.backoff);
        warn!(
            operation = operation_name,
            attempt,
            max = max_attempts,
            error_type = classification.error_type,
            delay_ms = delay.as_millis() as u64,
            error = %e,
            "Retrying after error"
        );
        tokio::time::sleep(delay).await;
    }

    Err(PipelineError::Internal("Retry loop exited unexpectedly".into()))
}
