use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a service log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parse the level token of a log line. Debug output counts as info,
    /// critical/fatal as error.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim_matches(|c| c == '[' || c == ']' || c == ':').to_ascii_uppercase().as_str() {
            "INFO" | "DEBUG" | "TRACE" | "NOTICE" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warning),
            "ERROR" | "ERR" | "CRITICAL" | "FATAL" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operational log entry, real or synthetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<f64>,
    pub message: String,
    /// Pod or process that emitted the line.
    pub source: Option<String>,
}

impl LogRecord {
    /// Render in the service's own line format.
    pub fn to_line(&self) -> String {
        let message = match &self.source {
            Some(src) => format!("[{}] {}", src, self.message),
            None => self.message.clone(),
        };
        format!(
            "{} {} {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            self.level,
            message
        )
    }
}
