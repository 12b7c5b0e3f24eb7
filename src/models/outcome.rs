/// What one attempt of an external action produced.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub attempt: u32,
    pub success: bool,
    /// Process exit code, or HTTP status for probes. `None` when the action
    /// never produced one (spawn failure, timeout, connection refused).
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Error raised by the action itself, if any.
    pub error: Option<String>,
    /// Classification of `error` (`TimeoutError`, `NetworkError`, ...).
    pub error_type: Option<&'static str>,
    pub duration_ms: u64,
}

impl AttemptRecord {
    /// Best single-line-ish diagnostic for a failed attempt.
    pub fn diagnostic(&self) -> String {
        if let Some(err) = &self.error {
            return err.clone();
        }
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.exit_code {
            Some(code) => format!("exited with status {}", code),
            None => "no output".to_string(),
        }
    }
}

/// Why the final attempt of a retried action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The action ran and reported failure.
    Rejected,
    /// The attempt hit its deadline.
    TimedOut,
    /// The action could not be started or its target could not be reached.
    Unavailable,
}

/// Result of running an external action under a retry policy.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub action: String,
    pub attempts_used: u32,
    pub succeeded: bool,
    pub last_error: Option<String>,
    /// Captures per attempt, oldest first. The last entry is authoritative.
    pub attempts: Vec<AttemptRecord>,
}

impl RetryOutcome {
    pub fn last_attempt(&self) -> Option<&AttemptRecord> {
        self.attempts.last()
    }

    pub fn stdout(&self) -> &str {
        self.last_attempt().map(|a| a.stdout.as_str()).unwrap_or("")
    }

    pub fn stderr(&self) -> &str {
        self.last_attempt().map(|a| a.stderr.as_str()).unwrap_or("")
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.last_attempt().and_then(|a| a.exit_code)
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        if self.succeeded {
            return None;
        }
        let last = self.last_attempt()?;
        Some(match last.error_type {
            Some("TimeoutError") => FailureKind::TimedOut,
            Some(_) => FailureKind::Unavailable,
            None => FailureKind::Rejected,
        })
    }

    /// Diagnostic text of the last attempt, empty on success.
    pub fn diagnostic(&self) -> String {
        self.last_error.clone().unwrap_or_default()
    }
}
