use std::path::PathBuf;

use async_trait::async_trait;

use crate::errors::{PipelineError, RetryExecutor};
use crate::models::outcome::RetryOutcome;
use crate::models::report::Report;
use crate::utils::truncation::excerpt;
use super::registry::AgentName;

/// Characters of a tool diagnostic carried into a report issue.
const ISSUE_DIAGNOSTIC_CHARS: usize = 300;

/// Whether a stage may go on to execute its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preparation {
    Ready,
    /// A precondition failed; the report already says why.
    Blocked,
}

/// Mutable state shared by a strategy and the agent running it.
pub struct StageContext {
    pub agent: AgentName,
    pub report: Report,
    pub executor: RetryExecutor,
    pub report_dir: PathBuf,
    evidence: String,
}

impl StageContext {
    pub fn new(agent: AgentName, executor: RetryExecutor, report_dir: PathBuf) -> Self {
        Self {
            agent,
            report: Report::new(agent.as_str()),
            executor,
            report_dir,
            evidence: String::new(),
        }
    }

    pub fn record_evidence(&mut self, label: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.evidence.push_str(&format!("== {} ==\n{}\n", label, text));
    }

    /// Keep the last attempt's output of an action as evidence.
    pub fn record_outcome(&mut self, outcome: &RetryOutcome) {
        let header = format!(
            "{} ({} attempt(s), {})",
            outcome.action,
            outcome.attempts_used,
            if outcome.succeeded { "ok" } else { "failed" }
        );
        let body = match outcome.last_attempt() {
            Some(last) => [last.stdout.trim(), last.stderr.trim(), last.error.as_deref().unwrap_or("")]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join("\n"),
            None => String::new(),
        };
        self.evidence.push_str(&format!("== {} ==\n{}\n", header, body));
    }

    pub fn evidence(&self) -> &str {
        &self.evidence
    }
}

/// The per-stage half of a run; [`super::StageAgent`] drives the rest.
#[async_trait]
pub trait StageStrategy: Send + Sync {
    fn agent(&self) -> AgentName;

    /// Gather input and check preconditions.
    async fn prepare(&mut self, ctx: &mut StageContext) -> Result<Preparation, PipelineError>;

    /// Run the external actions and settle the report status.
    async fn execute(&mut self, ctx: &mut StageContext) -> Result<(), PipelineError>;

    /// Raw text handed to the analyzer.
    fn evidence(&self, ctx: &StageContext) -> String {
        ctx.evidence().to_string()
    }

    /// Extra files written next to the report, as `(file name, content)`.
    fn artifacts(&self, _report: &Report) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Short, single-line form of a diagnostic for an issue string.
pub(crate) fn brief(diagnostic: &str) -> String {
    let line = diagnostic
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or("no output");
    let short = excerpt(line, ISSUE_DIAGNOSTIC_CHARS);
    if short.len() < line.len() {
        format!("{}...", short)
    } else {
        short.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brief_takes_last_line() {
        assert_eq!(brief("step 1\nstep 2\nERROR: no such file\n\n"), "ERROR: no such file");
        assert_eq!(brief(""), "no output");
        assert!(brief(&"x".repeat(500)).ends_with("..."));
    }

    #[test]
    fn test_evidence_skips_empty_sections() {
        let mut ctx = StageContext::new(AgentName::Build, RetryExecutor::default(), PathBuf::from("."));
        ctx.record_evidence("empty", "   ");
        ctx.record_evidence("docker", "Step 1/3");
        assert_eq!(ctx.evidence(), "== docker ==\nStep 1/3\n");
    }
}
