use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::errors::PipelineError;
use crate::models::log_record::{LogLevel, LogRecord};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parses the service's log format: `<timestamp> <LEVEL> [pod] <message>`.
///
/// The timestamp may be RFC 3339 or a naive `date time` pair (taken as UTC).
pub struct LogLineParser {
    line_re: Regex,
    pod_re: Regex,
    status_re: Regex,
    response_re: Regex,
}

impl LogLineParser {
    pub fn new() -> Result<Self, PipelineError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| PipelineError::Internal(format!("Invalid log pattern: {}", e)))
        };
        Ok(Self {
            line_re: compile(
                r"^(?P<ts>\d{4}-\d{2}-\d{2}(?:[ T]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?)?)\s+(?P<level>\[?[A-Za-z]+\]?:?)\s+(?P<rest>.*)$",
            )?,
            pod_re: compile(r"^\[(?P<pod>[^\]]+)\]\s*(?P<msg>.*)$")?,
            status_re: compile(r"\bHTTP\s+(?P<code>[1-5]\d{2})\b")?,
            response_re: compile(r"(?i)(?P<ms>\d+(?:\.\d+)?)\s*ms\b")?,
        })
    }

    /// Parse one line, `None` when it does not follow the format.
    pub fn parse_line(&self, line: &str) -> Option<LogRecord> {
        let caps = self.line_re.captures(line.trim())?;
        let timestamp = parse_timestamp(&caps["ts"])?;
        let level = LogLevel::parse(&caps["level"])?;
        let rest = caps["rest"].trim();

        let (source, message) = match self.pod_re.captures(rest) {
            Some(pod) => (Some(pod["pod"].to_string()), pod["msg"].trim().to_string()),
            None => (None, rest.to_string()),
        };

        let status_code = self
            .status_re
            .captures(&message)
            .and_then(|c| c["code"].parse::<u16>().ok());
        let response_time_ms = self
            .response_re
            .captures(&message)
            .and_then(|c| c["ms"].parse::<f64>().ok());

        Some(LogRecord {
            timestamp,
            level,
            status_code,
            response_time_ms,
            message,
            source,
        })
    }

    /// Parse a whole log dump, skipping lines that do not parse.
    pub fn parse_text(&self, text: &str) -> Vec<LogRecord> {
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| self.parse_line(l))
            .collect()
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}
