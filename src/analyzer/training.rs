use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::Analyzer;
use crate::db::PersistentHistory;
use crate::errors::PipelineError;
use crate::utils::truncation::excerpt;

/// Records considered when asking for suggestions.
pub const TRAINING_DEPTH: usize = 5;
const SUGGESTION_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub agent_name: String,
    pub training_timestamp: DateTime<Utc>,
    pub suggestions: String,
}

/// Ask the analyzer how an agent could do better, based on its recent
/// history, and store the answer back into that history.
pub async fn suggest_improvements(
    analyzer: &Analyzer,
    history: &PersistentHistory,
    agent_name: &str,
) -> Result<TrainingSummary, PipelineError> {
    if !analyzer.is_enabled() {
        return Err(PipelineError::Analyzer(
            "Training needs an analyzer provider; set analyzer.provider in the config".into(),
        ));
    }

    let records = history.recent_history(agent_name, TRAINING_DEPTH)?;
    info!(agent = agent_name, records = records.len(), "Requesting training suggestions");

    let prompt = analyzer.render("training", agent_name, None, None, &records)?;
    let reply = analyzer.complete(&prompt).await?;

    let summary = TrainingSummary {
        agent_name: agent_name.to_string(),
        training_timestamp: Utc::now(),
        suggestions: excerpt(reply.trim(), SUGGESTION_CHARS).to_string(),
    };
    history.append_history(agent_name, &serde_json::to_value(&summary)?)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::testing::scripted;
    use serde_json::json;

    #[tokio::test]
    async fn test_suggestions_are_stored_and_bounded() {
        let history = PersistentHistory::in_memory().unwrap();
        history.append_history("deploy", &json!({"status": "failed", "issues": ["kind missing"]})).unwrap();

        let long_reply = "Provision the cluster once per job and reuse it. ".repeat(10);
        let analyzer = scripted(vec![Ok(long_reply.as_str())]);
        let summary = suggest_improvements(&analyzer, &history, "deploy").await.unwrap();
        assert_eq!(summary.suggestions.chars().count(), 100);

        let records = history.recent_history("deploy", 10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].summary["agent_name"], "deploy");
        assert!(records[0].status().is_none());
    }

    #[tokio::test]
    async fn test_disabled_analyzer_cannot_train() {
        let history = PersistentHistory::in_memory().unwrap();
        let err = suggest_improvements(&Analyzer::disabled(), &history, "build").await.unwrap_err();
        assert!(matches!(err, PipelineError::Analyzer(_)));
        assert!(history.recent_history("build", 5).unwrap().is_empty());
    }
}
