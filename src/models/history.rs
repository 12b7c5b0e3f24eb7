use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One append-only entry in the agent history store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub agent_name: String,
    /// Strictly increasing per agent.
    pub timestamp: DateTime<Utc>,
    /// Serialized report or training summary.
    pub summary: Value,
}

impl HistoryRecord {
    /// Status of the summarized run, when the summary is a report.
    pub fn status(&self) -> Option<&str> {
        self.summary.get("status").and_then(Value::as_str)
    }
}

/// Status counts over an agent's most recent runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTrend {
    pub agent_name: String,
    pub runs: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Records without a report status (e.g. training summaries).
    pub other: usize,
    pub last_status: Option<String>,
}

impl StatusTrend {
    /// Builds the trend from records ordered newest first.
    pub fn from_records(agent_name: &str, records: &[HistoryRecord]) -> Self {
        let mut trend = StatusTrend {
            agent_name: agent_name.to_string(),
            ..Default::default()
        };
        for record in records {
            match record.status() {
                Some("success") => trend.success += 1,
                Some("failed") => trend.failed += 1,
                Some("skipped") => trend.skipped += 1,
                _ => {
                    trend.other += 1;
                    continue;
                }
            }
            trend.runs += 1;
            if trend.last_status.is_none() {
                trend.last_status = record.status().map(str::to_string);
            }
        }
        trend
    }

    pub fn success_rate(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.success as f64 / self.runs as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: i64, summary: Value) -> HistoryRecord {
        HistoryRecord {
            id,
            agent_name: "deploy".into(),
            timestamp: Utc::now(),
            summary,
        }
    }

    #[test]
    fn test_trend_counts_statuses() {
        let records = vec![
            record(4, json!({"status": "failed"})),
            record(3, json!({"suggestions": "retry kind earlier"})),
            record(2, json!({"status": "success"})),
            record(1, json!({"status": "success"})),
        ];
        let trend = StatusTrend::from_records("deploy", &records);
        assert_eq!(trend.runs, 3);
        assert_eq!(trend.success, 2);
        assert_eq!(trend.failed, 1);
        assert_eq!(trend.other, 1);
        assert_eq!(trend.last_status.as_deref(), Some("failed"));
        assert!((trend.success_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_empty_trend() {
        let trend = StatusTrend::from_records("build", &[]);
        assert_eq!(trend.runs, 0);
        assert_eq!(trend.success_rate(), 0.0);
        assert!(trend.last_status.is_none());
    }
}
