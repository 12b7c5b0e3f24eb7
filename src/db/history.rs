use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::Database;
use crate::errors::PipelineError;
use crate::models::history::{HistoryRecord, StatusTrend};

// Timestamp is max(now, previous + 1us) for the agent, computed inside the
// insert so concurrent writers cannot interleave a read and a write.
const APPEND_SQL: &str = "
INSERT INTO agent_history (agent_name, recorded_at_us, summary)
SELECT ?1,
       MAX(?2, COALESCE((SELECT MAX(recorded_at_us) FROM agent_history WHERE agent_name = ?1) + 1, ?2)),
       ?3
RETURNING id, recorded_at_us
";

impl Database {
    pub fn append_history(&self, agent_name: &str, summary: &Value) -> Result<HistoryRecord, PipelineError> {
        let conn = self.lock()?;
        let now_us = Utc::now().timestamp_micros();
        let payload = serde_json::to_string(summary)?;

        let (id, recorded_at_us) = conn
            .query_row(APPEND_SQL, rusqlite::params![agent_name, now_us, payload], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| PipelineError::Database(format!("Failed to append history: {}", e)))?;

        debug!(agent = agent_name, id, recorded_at_us, "Appended history record");
        Ok(HistoryRecord {
            id,
            agent_name: agent_name.to_string(),
            timestamp: from_micros(recorded_at_us)?,
            summary: summary.clone(),
        })
    }

    /// Most recent records for an agent, newest first.
    pub fn recent_history(&self, agent_name: &str, limit: usize) -> Result<Vec<HistoryRecord>, PipelineError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, recorded_at_us, summary FROM agent_history
                 WHERE agent_name = ?1 ORDER BY recorded_at_us DESC LIMIT ?2",
            )
            .map_err(|e| PipelineError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt
            .query_map(rusqlite::params![agent_name, limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| PipelineError::Database(format!("Query failed: {}", e)))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, recorded_at_us, summary) = row?;
            records.push(HistoryRecord {
                id,
                agent_name: agent_name.to_string(),
                timestamp: from_micros(recorded_at_us)?,
                // A hand-edited row should not hide the rest of the history
                summary: serde_json::from_str(&summary).unwrap_or(Value::String(summary)),
            });
        }
        Ok(records)
    }

    pub fn status_trend(&self, agent_name: &str, limit: usize) -> Result<StatusTrend, PipelineError> {
        let records = self.recent_history(agent_name, limit)?;
        Ok(StatusTrend::from_records(agent_name, &records))
    }
}

fn from_micros(us: i64) -> Result<DateTime<Utc>, PipelineError> {
    DateTime::from_timestamp_micros(us)
        .ok_or_else(|| PipelineError::Database(format!("Timestamp out of range: {}", us)))
}
