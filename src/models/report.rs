use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::utils::similarity::is_duplicate;

/// Bumped whenever a field is renamed or its meaning changes.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Keys owned by the report itself; stage fields may not shadow them.
const RESERVED_KEYS: &[&str] = &[
    "schema_version",
    "run_id",
    "agent",
    "status",
    "issues",
    "mitigations",
    "generated_at",
    "duration_ms",
];

/// Outcome of a stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Unknown,
    Success,
    Failed,
    Skipped,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Process exit code: 0 for success/skipped, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success | Self::Skipped => 0,
            Self::Failed | Self::Unknown => 1,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_schema_version() -> u32 {
    REPORT_SCHEMA_VERSION
}

/// The durable record of one stage run.
///
/// Stage-specific values are flattened into the top-level JSON object, so a
/// build report reads `{"status": "success", "issues": [], "image": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub agent: String,
    pub status: ReportStatus,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub mitigations: Vec<String>,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(flatten)]
    pub stage_fields: BTreeMap<String, Value>,
}

impl Report {
    pub fn new(agent: &str) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            run_id: uuid::Uuid::new_v4().to_string(),
            agent: agent.to_string(),
            status: ReportStatus::Unknown,
            issues: Vec::new(),
            mitigations: Vec::new(),
            generated_at: Utc::now(),
            duration_ms: 0,
            stage_fields: BTreeMap::new(),
        }
    }

    pub fn set_status(&mut self, status: ReportStatus) {
        self.status = status;
    }

    pub fn add_issue(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    pub fn add_mitigation(&mut self, mitigation: impl Into<String>) {
        self.mitigations.push(mitigation.into());
    }

    /// Mark the run failed with a diagnostic and the matching remedy.
    pub fn fail(&mut self, issue: impl Into<String>, mitigation: impl Into<String>) {
        self.status = ReportStatus::Failed;
        self.add_issue(issue);
        self.add_mitigation(mitigation);
    }

    /// Mark the run skipped; the issue explains why nothing was exercised.
    pub fn skip(&mut self, issue: impl Into<String>, mitigation: impl Into<String>) {
        self.status = ReportStatus::Skipped;
        self.add_issue(issue);
        self.add_mitigation(mitigation);
    }

    pub fn set_field<V: Serialize>(&mut self, key: &str, value: V) {
        if RESERVED_KEYS.contains(&key) {
            warn!(key, "Refusing to overwrite a reserved report key");
            return;
        }
        match serde_json::to_value(value) {
            Ok(v) => {
                self.stage_fields.insert(key.to_string(), v);
            }
            Err(e) => warn!(key, error = %e, "Stage field is not serializable"),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.stage_fields.get(key)
    }

    pub fn has_issue(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.issues.iter().any(|i| i.to_lowercase().contains(&needle))
    }

    /// Append supplementary entries, skipping any that repeat a known one.
    /// Returns how many entries were added.
    pub fn merge_findings(&mut self, issues: &[String], mitigations: &[String]) -> usize {
        let mut added = 0;
        for issue in issues {
            if push_unique(&mut self.issues, issue) {
                added += 1;
            }
        }
        for mitigation in mitigations {
            if push_unique(&mut self.mitigations, mitigation) {
                added += 1;
            }
        }
        added
    }

    /// Guarantee a terminal status before the report leaves the stage.
    pub fn finalize(&mut self) {
        if !self.status.is_terminal() {
            self.fail(
                "Stage ended without reaching a verdict",
                "Inspect the stage logs; the run was interrupted before its outcome was recorded",
            );
        }
        self.generated_at = Utc::now();
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}

fn push_unique(list: &mut Vec<String>, entry: &str) -> bool {
    let entry = entry.trim();
    if entry.is_empty() || list.iter().any(|e| is_duplicate(e, entry)) {
        return false;
    }
    list.push(entry.to_string());
    true
}
