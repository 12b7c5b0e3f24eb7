use serde::Serialize;

use crate::models::log_record::{LogLevel, LogRecord};
use crate::utils::formatting::round2;

/// Message fragments that mark a failed login, matched case-insensitively.
pub const AUTH_FAILURE_MARKERS: [&str; 4] = [
    "login failed",
    "authentication failed",
    "invalid credentials",
    "unauthorized",
];

/// Aggregate numbers over one batch of service logs.
///
/// Rates are percentages rounded to two decimals. Computed from the records
/// alone, so the same input always yields the same statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogStats {
    pub total_requests: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub error_rate: f64,
    pub success_rate: f64,
    /// Mean over records that carry a response time; 0 when none do.
    pub avg_response_time: f64,
    pub auth_failures: usize,
}

impl LogStats {
    pub fn compute(records: &[LogRecord]) -> Self {
        let total = records.len();
        let error_count = records.iter().filter(|r| r.level == LogLevel::Error).count();
        let warning_count = records.iter().filter(|r| r.level == LogLevel::Warning).count();

        let error_rate = if total == 0 {
            0.0
        } else {
            error_count as f64 / total as f64 * 100.0
        };

        let times: Vec<f64> = records.iter().filter_map(|r| r.response_time_ms).collect();
        let avg_response_time = if times.is_empty() {
            0.0
        } else {
            times.iter().sum::<f64>() / times.len() as f64
        };

        let auth_failures = records.iter().filter(|r| is_auth_failure(&r.message)).count();

        Self {
            total_requests: total,
            error_count,
            warning_count,
            error_rate: round2(error_rate),
            success_rate: round2(100.0 - error_rate),
            avg_response_time: round2(avg_response_time),
            auth_failures,
        }
    }

    /// Whether the share of errors is strictly above `threshold_pct`.
    /// Compares the exact counts; `error_rate` is rounded for display.
    pub fn exceeds_error_rate(&self, threshold_pct: f64) -> bool {
        self.error_count as f64 * 100.0 > threshold_pct * self.total_requests as f64
    }
}

pub fn is_auth_failure(message: &str) -> bool {
    let message = message.to_lowercase();
    AUTH_FAILURE_MARKERS.iter().any(|m| message.contains(m))
}
